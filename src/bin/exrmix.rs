use anyhow::bail;
use clap::{Parser, ValueEnum};

use exrmix::{Compression, ExrCodec, StoreOptions};

const EXAMPLES: &str = "\
Examples:
  Add two images:
    exrmix \"output.exr = a.exr + b.exr\"

  Rebuild a beauty pass from render elements:
    exrmix \"beauty.exr = (diffuse.exr * (lighting_raw.exr + gi_raw.exr)) + specular.exr + sss.exr\"

  Compose whole sequences with the # wildcard:
    exrmix \"no_reflection_#.exr = beauty_#.exr - reflection_#.exr\"

  Fixed-width frame numbers with a ? run:
    exrmix \"graded_????.exr = raw_????.exr * 1.2\"

  Constants work too:
    exrmix \"signed_normals.exr = (unsigned_normals.exr - 0.5) * 2.0\"";

#[derive(Parser, Debug)]
#[command(
    name = "exrmix",
    version,
    about = "Compose OpenEXR images and sequences with arithmetic expressions",
    after_help = EXAMPLES
)]
struct Cli {
    /// Compose expression: "output.exr = <arithmetic over .exr files and constants>".
    expression: String,

    /// Compression for stored outputs.
    #[arg(short, long, value_enum, default_value_t = CompressionArg::Zip)]
    compression: CompressionArg,

    /// Override the number of worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Re-open every produced file afterwards and report decode failures.
    #[arg(long, default_value_t = false)]
    verify: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    /// Uncompressed output.
    No,
    /// Run-length encoding.
    Rle,
    /// zlib, one scan line at a time.
    ZipSingle,
    /// zlib in blocks of 16 scan lines (the default).
    Zip,
    /// PIZ wavelet compression.
    Piz,
    /// Lossy 24-bit float compression.
    Pxr24,
    /// Lossy 4x4 block compression, fixed rate.
    B44,
    /// Lossy 4x4 block compression, flat fields compressed more.
    B44a,
    /// Lossy DCT compression, 32-scanline blocks.
    Dwaa,
    /// Lossy DCT compression, 256-scanline blocks (smallest files).
    Dwab,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::No => Compression::None,
            CompressionArg::Rle => Compression::Rle,
            CompressionArg::ZipSingle => Compression::ZipSingle,
            CompressionArg::Zip => Compression::Zip,
            CompressionArg::Piz => Compression::Piz,
            CompressionArg::Pxr24 => Compression::Pxr24,
            CompressionArg::B44 => Compression::B44,
            CompressionArg::B44a => Compression::B44a,
            CompressionArg::Dwaa => Compression::Dwaa,
            CompressionArg::Dwab => Compression::Dwab,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let cli = Cli::parse();

    let plan = exrmix::parse_and_resolve(&cli.expression)?;
    eprintln!("{}", plan.assignment);

    let codec = ExrCodec;
    let options = StoreOptions {
        compression: cli.compression.into(),
    };
    let report = exrmix::run_batch(&plan, &codec, &options, cli.threads)?;

    for failure in &report.failures {
        eprintln!("error: {}: {}", failure.output_path, failure.error);
    }
    eprintln!("wrote {} file(s)", report.written.len());

    if cli.verify {
        let verify = exrmix::batch::verify_outputs(&report.written, &codec);
        eprintln!(
            "verified {} file(s), {} failed",
            verify.checked - verify.failures.len(),
            verify.failures.len()
        );
        if !verify.all_ok() {
            bail!("output verification failed");
        }
    }

    if !report.all_ok() {
        bail!(
            "{} of {} jobs failed",
            report.failures.len(),
            plan.batch.jobs.len()
        );
    }
    Ok(())
}
