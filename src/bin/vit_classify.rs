use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use sysinfo::{ProcessExt, System, SystemExt};
use tracing_subscriber::EnvFilter;
use vit_flow::config::{AttentionScaling, VitConfig};
use vit_flow::data::{FileImageDecoder, ResizePolicy};
use vit_flow::error::{Result, VitError};
use vit_flow::models::vit::VisionTransformer;
use vit_flow::nn::classifier::{argmax, softmax_probabilities};
use vit_flow::pipeline::{classify_batch, BatchOutput};
use vit_flow::weights::{ConstantWeights, RandomWeights, WeightProvider};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeightSource {
    /// Every weight set to `--weight-value`
    Constant,
    /// Uniform in `[-weight-range, weight-range)`, seeded by `--seed`
    Random,
}

/// Classify images with a single-block vision transformer
#[derive(Parser, Debug)]
#[command(name = "vit_classify", version)]
struct Cli {
    /// Image files to classify
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Side length images must have, in pixels
    #[arg(long, default_value_t = 32)]
    image_size: usize,

    /// Patch edge length; must divide the image size
    #[arg(long, default_value_t = 4)]
    patch_size: usize,

    /// Model width
    #[arg(long, default_value_t = 64)]
    d_model: usize,

    /// Number of output classes
    #[arg(long, default_value_t = 2)]
    num_classes: usize,

    /// Divide attention scores by sqrt(d_model)
    #[arg(long)]
    scale_attention: bool,

    /// Resize images to the configured size instead of rejecting them
    #[arg(long)]
    resize: bool,

    /// Where the weights come from
    #[arg(long, value_enum, default_value_t = WeightSource::Constant)]
    weights: WeightSource,

    #[arg(long, default_value_t = 0.01)]
    weight_value: f32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 0.02)]
    weight_range: f32,

    /// Print the resolved model configuration as JSON before running
    #[arg(long)]
    print_config: bool,

    /// Log per-stage values for every image
    #[arg(short, long)]
    verbose: bool,
}

fn build_model(cli: &Cli) -> Result<VisionTransformer> {
    let scaling = if cli.scale_attention {
        AttentionScaling::InverseSqrtDim
    } else {
        AttentionScaling::None
    };
    let config = VitConfig::new(cli.image_size, cli.patch_size, cli.d_model, cli.num_classes)?
        .with_attention_scaling(scaling);

    if cli.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("WARN: could not serialize config: {}", e),
        }
    }

    let provider: Box<dyn WeightProvider> = match cli.weights {
        WeightSource::Constant => Box::new(ConstantWeights {
            value: cli.weight_value,
        }),
        WeightSource::Random => Box::new(RandomWeights {
            seed: cli.seed,
            range: cli.weight_range,
        }),
    };
    VisionTransformer::from_provider(config, provider.as_ref())
}

fn report(output: &BatchOutput) {
    for item in &output.logits {
        let probs = softmax_probabilities(&item.logits);
        let formatted: Vec<String> = item.logits.iter().map(|v| format!("{:.6}", v)).collect();
        match argmax(&item.logits) {
            Some(class) => println!(
                "{}: logits [{}] -> class {} (p={:.4})",
                item.path.display(),
                formatted.join(", "),
                class,
                probs[class]
            ),
            None => println!("{}: logits []", item.path.display()),
        }
    }
    for failure in &output.failures {
        match &failure.error {
            // Already names the file.
            VitError::Decode { .. } => eprintln!("Skipped image: {}", failure.error),
            other => eprintln!("Skipped image {}: {}", failure.path.display(), other),
        }
    }
}

/// Reports the current process's memory usage.
fn report_memory_usage(system: &mut System, stage: &str) {
    if let Ok(pid) = sysinfo::get_current_pid() {
        system.refresh_process(pid);
        if let Some(process) = system.process(pid) {
            let memory_mb = process.memory() as f32 / (1024.0 * 1024.0);
            tracing::info!("MEMORY USAGE ({}): {:.2} MB", stage, memory_mb);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut system = System::new();

    let model = match build_model(&cli) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    report_memory_usage(&mut system, "after model init");

    let resize = if cli.resize {
        ResizePolicy::Stretch
    } else {
        ResizePolicy::Reject
    };
    let decoder = FileImageDecoder::new(model.config()).with_resize(resize);

    let output = classify_batch(&model, &decoder, &cli.paths);
    report(&output);
    report_memory_usage(&mut system, "after batch");

    if output.logits.is_empty() {
        process::exit(1);
    }
}
