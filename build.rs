fn main() {
    // Host builds (unit and integration tests) never touch ESP-IDF.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
