use blendkit::fbx::{self, FbxError};
use log::info;
use std::{env, fs, fs::File, io::BufWriter, path::PathBuf, process};

fn run(input: &PathBuf, output: &PathBuf) -> Result<(), FbxError> {
    let data = fs::read(input)?;
    let (root, version) = fbx::parse::from_slice(&data)?;

    info!(
        "{}: {} root elements, version {}",
        input.display(),
        root.children.len(),
        version
    );

    let doc = fbx::json::doc_to_json(&root, version);
    let file = File::create(output)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next(), args.next()) {
        (Some(input), output, None) => {
            let input = PathBuf::from(input);
            let output = output
                .map(PathBuf::from)
                .unwrap_or_else(|| input.with_extension("json"));
            (input, output)
        }
        _ => {
            eprintln!("usage: fbx2json <file.fbx> [out.json]");
            process::exit(2);
        }
    };

    if let Err(err) = run(&input, &output) {
        eprintln!("{}: {}", input.display(), err);
        process::exit(1);
    }
}
