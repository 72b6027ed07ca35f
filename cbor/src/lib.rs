#![no_std]

pub mod decode;
pub mod encode;

mod decode_seq;
