//! Handler status codes and their symbolic names.
//!
//! Handlers return a plain `i32`: zero is success, anything else is a
//! handler-defined failure. The console reports failures with the symbolic name
//! of the code when it is one of the well-known device error codes below.

/// Success.
pub const OK: i32 = 0;
/// Generic failure.
pub const FAIL: i32 = -1;
/// Out of memory.
pub const NO_MEM: i32 = 0x101;
/// Invalid argument.
pub const INVALID_ARG: i32 = 0x102;
/// Invalid state.
pub const INVALID_STATE: i32 = 0x103;
/// Invalid size.
pub const INVALID_SIZE: i32 = 0x104;
/// Requested resource not found.
pub const NOT_FOUND: i32 = 0x105;
/// Operation or feature not supported.
pub const NOT_SUPPORTED: i32 = 0x106;
/// Operation timed out.
pub const TIMEOUT: i32 = 0x107;
/// Received response was invalid.
pub const INVALID_RESPONSE: i32 = 0x108;
/// CRC or checksum was invalid.
pub const INVALID_CRC: i32 = 0x109;
/// Version was invalid.
pub const INVALID_VERSION: i32 = 0x10A;
/// MAC address was invalid.
pub const INVALID_MAC: i32 = 0x10B;

const NAMES: &[(i32, &str)] = &[
    (OK, "OK"),
    (FAIL, "FAIL"),
    (NO_MEM, "NO_MEM"),
    (INVALID_ARG, "INVALID_ARG"),
    (INVALID_STATE, "INVALID_STATE"),
    (INVALID_SIZE, "INVALID_SIZE"),
    (NOT_FOUND, "NOT_FOUND"),
    (NOT_SUPPORTED, "NOT_SUPPORTED"),
    (TIMEOUT, "TIMEOUT"),
    (INVALID_RESPONSE, "INVALID_RESPONSE"),
    (INVALID_CRC, "INVALID_CRC"),
    (INVALID_VERSION, "INVALID_VERSION"),
    (INVALID_MAC, "INVALID_MAC"),
];

/// Symbolic name of a status code, or `"UNKNOWN ERROR"`.
pub fn name(code: i32) -> &'static str {
    NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
        .unwrap_or("UNKNOWN ERROR")
}
