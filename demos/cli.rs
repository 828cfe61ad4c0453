//! Reduce an image to `k` colors for one or more values of `k` and write each result as a PNG.

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use colorcluster::{ClusterCount, ImageBuf, Quantizer, kmeans::KmeansOptions, resize::Resize};
use image::RgbImage;
use palette::Srgb;
use std::{
    fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Instant,
};

/// Command line options for the demo.
#[derive(Parser)]
pub struct Options {
    /// The number of colors to reduce the image to. Can be given more than once.
    #[arg(short, required = true)]
    k: Vec<ClusterCount>,

    /// Resize the input to this width before clustering.
    #[arg(long, conflicts_with = "scale")]
    width: Option<u32>,

    /// Resize the input to this height before clustering.
    #[arg(long, conflicts_with = "scale")]
    height: Option<u32>,

    /// Scale both input dimensions by this factor before clustering.
    #[arg(long)]
    scale: Option<f64>,

    /// The largest centroid movement per channel that still counts as converged.
    #[arg(long, default_value_t = KmeansOptions::new().get_tolerance())]
    tolerance: f64,

    /// The seed for the initial random partition.
    #[arg(long, default_value_t = KmeansOptions::new().get_seed())]
    seed: u64,

    /// Stop after this many iterations even if not converged.
    #[arg(long)]
    max_iterations: Option<NonZeroU32>,

    /// The number of threads to use. `1` runs single threaded and `0` uses every core.
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    /// Print timings.
    #[arg(long)]
    verbose: bool,

    /// The image to quantize.
    input: PathBuf,

    /// The directory to write `<stem>_k<k>.png` files into.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn resize_policy(options: &Options) -> Option<Resize> {
    match (options.width, options.height, options.scale) {
        (Some(width), Some(height), _) => Some(Resize::Exact { width, height }),
        (Some(width), None, _) => Some(Resize::Width(width)),
        (None, Some(height), _) => Some(Resize::Height(height)),
        (None, None, Some(scale)) => Some(Resize::Scale(scale)),
        (None, None, None) => None,
    }
}

fn output_path(dir: &Path, input: &Path, k: ClusterCount) -> Result<PathBuf> {
    let Some(stem) = input.file_stem() else {
        bail!("input path {} has no file name", input.display());
    };
    let mut name = stem.to_os_string();
    name.push(format!("_k{k}.png"));
    Ok(dir.join(name))
}

fn print_palette(k: ClusterCount, colors: &[Srgb<u8>]) {
    let hex = colors
        .iter()
        .map(|color| format!("#{color:x}"))
        .collect::<Vec<_>>();
    println!("k = {k}: {}", hex.join(" "));
}

fn main() -> Result<()> {
    env_logger::init();
    let options = Options::parse();
    let verbose = options.verbose;

    macro_rules! time {
        ($name: expr, $val: expr) => {
            if verbose {
                let time = Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = time!(
        "read image",
        image::open(&options.input)
            .with_context(|| format!("failed to read {}", options.input.display()))?
            .into_rgb8()
    );

    let image = match resize_policy(&options) {
        Some(resize) => time!("resize", resize.apply(&image)?),
        None => image,
    };
    let image = ImageBuf::try_from(image).context("image is too large")?;

    fs::create_dir_all(&options.output)
        .with_context(|| format!("failed to create {}", options.output.display()))?;

    let kmeans_options = KmeansOptions::new()
        .tolerance(options.tolerance)
        .seed(options.seed)
        .max_iterations(options.max_iterations);

    let parallel = options.threads != 1;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(if parallel { options.threads.into() } else { 0 })
        .build()?;

    let mut quantizer = Quantizer::with_options(image, kmeans_options).parallel(parallel);

    for &k in &options.k {
        let clustering = time!(
            format!("clustering with k = {k}"),
            pool.install(|| quantizer.cluster(k).cloned())?
        );
        let iterations = clustering.convergence().iterations();
        print_palette(k, clustering.centroids().rounded());

        let quantized: RgbImage = time!(
            format!("remapping with k = {k}"),
            pool.install(|| quantizer.quantize(k).cloned())?.into()
        );

        let path = output_path(&options.output, &options.input, k)?;
        time!(
            "write image",
            quantized
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?
        );

        if verbose {
            println!("k = {k}: {iterations} iterations, wrote {}", path.display());
        }
    }

    Ok(())
}
