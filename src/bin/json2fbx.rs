use blendkit::fbx::{self, FbxError};
use log::info;
use std::{env, fs, fs::File, io::BufWriter, path::PathBuf, process};

fn run(input: &PathBuf, output: &PathBuf) -> Result<(), FbxError> {
    let data = fs::read(input)?;
    let doc: serde_json::Value = serde_json::from_slice(&data)?;
    let (root, version) = fbx::json::parse_json(&doc)?;

    info!(
        "{}: {} root elements, version {}",
        input.display(),
        root.children.len(),
        version
    );

    let file = File::create(output)?;
    fbx::encode::write(BufWriter::new(file), &root, version)
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next(), args.next()) {
        (Some(input), output, None) => {
            let input = PathBuf::from(input);
            let output = output
                .map(PathBuf::from)
                .unwrap_or_else(|| input.with_extension("fbx"));
            (input, output)
        }
        _ => {
            eprintln!("usage: json2fbx <file.json> [out.fbx]");
            process::exit(2);
        }
    };

    if let Err(err) = run(&input, &output) {
        eprintln!("{}: {}", input.display(), err);
        process::exit(1);
    }
}
