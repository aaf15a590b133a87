use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Capability descriptor text did not parse.
    #[snafu(display("malformed device description: {source}"))]
    MalformedDescriptor { source: serde_json::Error },
}
