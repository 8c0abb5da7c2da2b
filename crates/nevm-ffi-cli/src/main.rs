//! Binding generator for the native apps, `uniffi-bindgen generate --language kotlin ...` for
//! android, anything else goes through the swift generator for ios

fn main() {
    let kotlin = std::env::args().any(|arg| arg.to_lowercase().contains("kotlin"));

    match kotlin {
        true => uniffi::uniffi_bindgen_main(),
        false => uniffi::uniffi_bindgen_swift(),
    }
}
