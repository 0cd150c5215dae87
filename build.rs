fn main() {
    // ESP-IDF sysenv propagation is only meaningful when building for the
    // espidf target; host builds (tests, simulation) skip it.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
