use color_print::cprintln;
use indexmap::IndexMap;
use lcasm::{link, Error, TranslationUnit};
use std::io::Write;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input files; each file after the first extends the unit before it
    #[clap(required = true)]
    input: Vec<String>,

    /// Output file
    #[clap(short, long, default_value = "a.out")]
    output: String,

    /// Dump the linked words with their disassembly
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    let mut files: IndexMap<String, Vec<String>> = IndexMap::new();

    println!("1. Parse");
    let mut inputs = args.input.iter();
    let Some(first) = inputs.next() else { return };
    let mut unit = match TranslationUnit::parse(&load(first, &mut files)) {
        Ok(unit) => unit,
        Err(error) => fail_parse(error, first, &files),
    };
    for path in inputs {
        let text = load(path, &mut files);
        unit = match TranslationUnit::parse_extend(&text, unit) {
            Ok(unit) => unit,
            Err(error) => fail_parse(error, path, &files),
        };
    }

    println!("2. Link");
    let words = match link(&unit) {
        Ok(words) => words,
        Err(error) => {
            // line numbers restart per chunk, so no single file to point at
            cprintln!("<red,bold>error</>: {} (line {})", error, error.line());
            std::process::exit(1);
        }
    };
    for label in unit.unreferenced() {
        cprintln!("<yellow,bold>warn</>: unused label `{}`", label);
    }

    println!("  > {}", &args.output);
    let mut buf: Vec<u8> = Vec::with_capacity(words.len() * 2);
    for word in &words {
        buf.extend_from_slice(&word.to_le_bytes());
    }
    let mut file = match std::fs::File::create(&args.output) {
        Ok(file) => file,
        Err(error) => {
            cprintln!("<red,bold>error</>: failed to create {}: {}", &args.output, error);
            std::process::exit(1);
        }
    };
    if let Err(error) = file.write_all(&buf) {
        cprintln!("<red,bold>error</>: failed to write {}: {}", &args.output, error);
        std::process::exit(1);
    }

    if args.dump {
        for (addr, word) in words.iter().enumerate() {
            let asm = match arch::inst::Inst::decode(*word) {
                Some(inst) => inst.cformat(),
                None => String::new(),
            };
            cprintln!("<green>{:04X}</> | <yellow>x{:04X}</> | {}", addr, word, asm);
        }
    }
}

fn load(path: &str, files: &mut IndexMap<String, Vec<String>>) -> String {
    println!("  < {}", path);
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            cprintln!("<red,bold>error</>: failed to read {}: {}", path, error);
            std::process::exit(1);
        }
    };
    files.insert(path.to_string(), text.lines().map(str::to_string).collect());
    text
}

fn fail_parse(error: Error, path: &str, files: &IndexMap<String, Vec<String>>) -> ! {
    let lines = files.get(path).map(|v| v.as_slice()).unwrap_or(&[]);
    error.print_diag(path, lines);
    std::process::exit(1)
}
