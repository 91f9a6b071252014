use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Pass CPU frequency for timing calculations
    println!("cargo:rustc-env=MCU_FREQ_HZ=16000000");

    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        // Host builds only carry the control library and its unit tests
        return;
    }

    // Configure for the Arduino Mega board
    println!("cargo:rustc-link-arg=-mmcu=atmega2560");

    // Debug builds get verbose serial tracing
    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:rustc-cfg=feature=\"debug\"");
    }

    println!("cargo:warning=Building sculpture firmware for ATmega2560 at 16MHz");
}
