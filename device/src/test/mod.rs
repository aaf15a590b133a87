mod unit {
    mod descriptor;
}
