fn main() {
    // ESP-IDF builds need the sysenv exported by embuild; host builds need nothing.
    #[cfg(feature = "esp-idf")]
    embuild::espidf::sysenv::output();
}
