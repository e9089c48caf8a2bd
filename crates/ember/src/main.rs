//! Ember - Main Entry Point
//!
//! Builds reduction strategies from the command line and prints every
//! stage: the resolved implementation, the compute output, the lowered
//! loop nests and the scheduled tree.

use anyhow::{bail, Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use ember_ir::{DType, Dim, ModuleExpr, Shape, Tensor, TensorOp};
use ember_pe::lower_reduction;
use ember_session::Options;
use ember_strategy::{init_global_registry, ArgPack, AttrStore, PackedArg, ReduceEntry};
use ember_target::{host_target, Target};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Ember - reduction strategy explorer
#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered operators
    List,

    /// Build, compute, lower and schedule one reduction
    Lower(LowerArgs),
}

#[derive(clap::Args, Debug)]
struct LowerArgs {
    /// Operator name, e.g. reduce_sum
    op: String,

    /// Input shape; symbolic dimensions are given by name (e.g. N,4)
    #[arg(long, value_delimiter = ',', required = true)]
    shape: Vec<String>,

    /// Axes to reduce; negative values count from the end
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    axis: Vec<i64>,

    /// Reduce every axis
    #[arg(long, conflicts_with = "axis")]
    all_axes: bool,

    /// Keep reduced axes with size one
    #[arg(long)]
    keepdim: bool,

    /// Element type of the input
    #[arg(long, value_enum, default_value = "f32")]
    dtype: DTypeArg,

    /// Target architecture (defaults to the config file, then the host)
    #[arg(long)]
    target: Option<String>,

    /// Use the symbolic-shape strategy
    #[arg(long)]
    symbolic: bool,

    /// Emitter used for the lowered body
    #[arg(long, value_enum, default_value = "naive")]
    emitter: Emitter,
}

/// Input element type
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DTypeArg {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    F16,
    Bf16,
    F32,
    F64,
}

impl From<DTypeArg> for DType {
    fn from(arg: DTypeArg) -> Self {
        match arg {
            DTypeArg::Bool => DType::Bool,
            DTypeArg::I8 => DType::Int8,
            DTypeArg::I16 => DType::Int16,
            DTypeArg::I32 => DType::Int32,
            DTypeArg::I64 => DType::Int64,
            DTypeArg::U8 => DType::UInt8,
            DTypeArg::F16 => DType::Float16,
            DTypeArg::Bf16 => DType::BFloat16,
            DTypeArg::F32 => DType::Float32,
            DTypeArg::F64 => DType::Float64,
        }
    }
}

/// Reduction emitter
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Emitter {
    /// Single naive loop nest
    Naive,
    /// Partial reduction into a temporary, then a final one
    TwoStep,
    /// Single-pass block reduction
    BlockShuffle,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = match &cli.config {
        Some(path) => Options::load(path).with_context(|| format!("loading {path}"))?,
        None => Options::default(),
    };
    let registry = init_global_registry(&options.strategy)?;

    match cli.command {
        Commands::List => {
            for name in registry.names() {
                if let Some(record) = registry.get(name) {
                    let dtype = record
                        .dtype
                        .map_or_else(|| "any".to_string(), |d| d.to_string());
                    println!(
                        "{name:<12} {:?} inputs={} outputs={} level={} dtype={dtype}",
                        record.pattern, record.num_inputs, record.num_outputs, record.support_level
                    );
                }
            }
        }
        Commands::Lower(args) => {
            let target = resolve_target(args.target.as_deref(), options.target.as_deref())?;
            lower(&args, &target)?;
        }
    }

    Ok(())
}

/// Pick the target from the command line, then the config file, then the host.
fn resolve_target(cli: Option<&str>, config: Option<&str>) -> Result<Target> {
    match cli.or(config) {
        Some(name) => Ok(Target::parse(name)?),
        None => Ok(host_target()),
    }
}

fn parse_shape(dims: &[String]) -> Shape {
    Shape::new(dims.iter().map(|d| match d.trim().parse::<usize>() {
        Ok(n) => Dim::Static(n),
        Err(_) => Dim::Symbolic(d.trim().to_string()),
    }))
}

fn lower(args: &LowerArgs, target: &Target) -> Result<()> {
    let registry = ember_strategy::global_registry()?;
    let Some(record) = registry.get(&args.op) else {
        bail!("unknown operator `{}`", args.op);
    };

    let shape = parse_shape(&args.shape);
    if !args.symbolic && !shape.is_static() {
        bail!("shape {shape} has symbolic dimensions; pass --symbolic");
    }
    let dtype = DType::from(args.dtype);
    let x = Tensor::placeholder("x", shape, dtype);

    let mut attrs = AttrStore::new().with("keepdim", args.keepdim);
    if args.all_axes {
        attrs.insert("axis", true);
    } else {
        attrs.insert("axis", args.axis.clone());
    }

    tracing::info!("Lowering {} for {}", args.op, target);
    let build = if args.symbolic {
        &record.strategy_symbolic
    } else {
        &record.strategy
    };
    let strategy = build(&attrs, std::slice::from_ref(&x), &[dtype], &[], target)?;
    let Some(imp) = strategy.best_impl() else {
        bail!("`{}` has no implementation", args.op);
    };
    println!("impl: {} (priority {})", imp.name, imp.priority);

    let computed = imp.compute(&ArgPack::wrap(ArgPack::new(vec![
        PackedArg::Tensor(x.clone()),
        PackedArg::from("out"),
    ])))?;
    let Some(out) = computed.get(0).and_then(PackedArg::as_tensor) else {
        bail!("compute returned no tensor");
    };
    println!("compute: {out}");

    let tensors = emit(args.emitter, &args.op, &x, out)?;
    let mut roots = Vec::with_capacity(tensors.len());
    for tensor in &tensors {
        roots.push(lower_reduction(tensor)?);
    }

    match imp.schedule.as_ref() {
        Some(schedule) => {
            let packed: Vec<PackedArg> = roots
                .into_iter()
                .map(PackedArg::Expr)
                .chain(tensors.into_iter().map(PackedArg::Tensor))
                .collect();
            let scheduled = schedule(&ArgPack::new(packed))?;
            let Some(merged) = scheduled.get(0).and_then(PackedArg::as_stmt) else {
                bail!("schedule returned no statement tree");
            };
            println!("schedule:");
            print!("{merged}");
        }
        None => {
            println!("lowered (scheduling deferred):");
            print!("{}", ModuleExpr::new(roots));
        }
    }
    Ok(())
}

/// Re-emit the computed reduction with the selected emitter.
fn emit(emitter: Emitter, op: &str, x: &Tensor, out: &Tensor) -> Result<Vec<Tensor>> {
    let TensorOp::Reduce { axes, keepdim, .. } = &out.op else {
        bail!("`{}` is not a reduction output", out.name);
    };
    let Some(entry) = ReduceEntry::find(op) else {
        bail!("`{op}` is not a reduction");
    };
    let tensors = match emitter {
        Emitter::Naive => vec![out.clone()],
        Emitter::TwoStep => (entry.two_step)(x, axes, *keepdim, &out.name),
        Emitter::BlockShuffle => (entry.block_shuffle)(x, axes, *keepdim, &out.name),
    };
    Ok(tensors)
}
