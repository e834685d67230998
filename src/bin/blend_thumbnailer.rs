use blendkit::thumb;
use log::info;
use std::{env, fs::File, io::BufWriter, process};

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next(), args.next()) {
        (Some(input), Some(output), None) => (input, output),
        _ => {
            eprintln!("usage: blend-thumbnailer <file.blend> <out.png>");
            process::exit(2);
        }
    };

    let thumb = match thumb::extract_thumb_from_path(&input) {
        Ok(Some(thumb)) => thumb,
        Ok(None) => {
            eprintln!("{}: no thumbnail", input);
            process::exit(1);
        }
        Err(err) => {
            eprintln!("{}: {}", input, err);
            process::exit(1);
        }
    };

    info!("{}: {}x{} thumbnail", input, thumb.width, thumb.height);

    let result = File::create(&output)
        .and_then(|file| thumb.write_png(BufWriter::new(file)));
    if let Err(err) = result {
        eprintln!("{}: {}", output, err);
        process::exit(1);
    }
}
