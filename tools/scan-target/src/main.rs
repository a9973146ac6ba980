//! Scan practice target
//!
//! Prints a handful of typed values together with their addresses, then
//! changes them every time a newline arrives on stdin. Any other input
//! ends the process. Run it in one terminal and point scan sessions at
//! it from another.

use std::io::{self, BufRead, Write};
use std::mem::size_of;

fn main() -> io::Result<()> {
    let mut byte: u8 = 29;
    let mut gold: i32 = 1000;
    let mut silver: i32 = 1000;
    let mut bronze: i32 = 1000;
    let mut health: i16 = 12500;
    let mut ratio: f32 = 1.232_42;

    let pid = std::process::id();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut iteration = 1u64;

    loop {
        println!("Iteration: {} (pid {})", iteration, pid);
        println!(
            "Byte   ({} byte):  {:<9} - {:p}",
            size_of::<u8>(),
            byte,
            &byte
        );
        println!(
            "Gold   ({} bytes): {:<9} - {:p}",
            size_of::<i32>(),
            gold,
            &gold
        );
        println!(
            "Silver ({} bytes): {:<9} - {:p}",
            size_of::<i32>(),
            silver,
            &silver
        );
        println!(
            "Bronze ({} bytes): {:<9} - {:p}",
            size_of::<i32>(),
            bronze,
            &bronze
        );
        println!(
            "Health ({} bytes): {:<9} - {:p}",
            size_of::<i16>(),
            health,
            &health
        );
        println!(
            "Ratio  ({} bytes): {:<9} - {:p}",
            size_of::<f32>(),
            ratio,
            &ratio
        );
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line != "\n" {
            return Ok(());
        }

        byte = byte.wrapping_add(1);
        gold -= 1;
        silver -= 2;
        bronze -= 3;
        health -= 4;
        ratio += 0.5;
        iteration += 1;
    }
}
