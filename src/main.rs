use std::{env, fs};

use anyhow::Context;
use jpegprobe::JpegInspector;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let [path] = &*args else {
        println!("usage: jpegprobe <file.jpg>");
        return Ok(());
    };

    let buf = fs::read(path).with_context(|| format!("failed to read {path}"))?;
    let mut parser = JpegInspector::new(&buf)?;
    while let Some(segment) = parser.next_segment()? {
        print!("{segment}");
    }

    Ok(())
}
