//! Boundary constants injected by the "interesting value" operators.
//!
//! Each wider table starts with every entry of the narrower ones, so a 32-bit
//! injection can still land on an 8-bit edge.

/// Maximum magnitude added or subtracted by the arithmetic operators.
pub const ARITH_MAX: u32 = 35;

pub const INTERESTING_8: [i8; 9] = [
    -128, // overflow signed 8-bit when decremented
    -1,
    0,
    1,
    16, // one-off with common buffer size
    32,
    64,
    100,
    127, // overflow signed 8-bit when incremented
];

pub const INTERESTING_16: [i16; 19] = [
    -128,
    -1,
    0,
    1,
    16,
    32,
    64,
    100,
    127,
    -32768, // overflow signed 16-bit when decremented
    -129,   // overflow signed 8-bit
    128,
    255, // overflow unsigned 8-bit when incremented
    256,
    512,
    1000,
    1024,
    4096,
    32767, // overflow signed 16-bit when incremented
];

pub const INTERESTING_32: [i32; 27] = [
    -128,
    -1,
    0,
    1,
    16,
    32,
    64,
    100,
    127,
    -32768,
    -129,
    128,
    255,
    256,
    512,
    1000,
    1024,
    4096,
    32767,
    -2147483648, // overflow signed 32-bit when decremented
    -100663046,  // large negative, endian-agnostic
    -32769,      // overflow signed 16-bit
    32768,
    65535, // overflow unsigned 16-bit when incremented
    65536,
    100663045,  // large positive, endian-agnostic
    2147483647, // overflow signed 32-bit when incremented
];
