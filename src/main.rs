use anyhow::Context;
use clap::Parser;
use kbquery::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Ask questions against a small knowledge base
#[derive(Parser, Debug)]
#[command(name = "kbquery")]
#[command(about = "A terminal chatbot over a fixed knowledge base", long_about = None)]
struct Args {
    /// Knowledge file: one sentence per line, a JSON record array, or a FAQ map
    #[arg(short, long, default_value = "knowledge.txt")]
    knowledge: PathBuf,

    /// Built-in configuration (plain_text, search_full, heritage, faq, population)
    #[arg(short, long, default_value = "plain_text")]
    preset: String,

    /// JSON configuration file; replaces --preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for tie-breaking; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// How many equally good matches to draw from
    #[arg(long)]
    pool: Option<usize>,

    /// Scores closer than this count as equally good
    #[arg(long)]
    tie_epsilon: Option<f32>,

    /// Print replies as JSON lines
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => presets::by_name(&args.preset)?,
    };
    if let Some(pool) = args.pool {
        config.top_pool_size = pool;
    }
    if let Some(epsilon) = args.tie_epsilon {
        config.tie_epsilon = Some(epsilon);
    }

    let source = KnowledgeSource::detect(&args.knowledge);
    info!("Knowledge source: {:?}", source);
    let engine = Engine::from_source(&source, config, HashEmbedder::default())?;
    if engine.store().is_empty() {
        warn!("Knowledge base {:?} is empty, every question will go unanswered", args.knowledge);
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut session = SessionMemory::new();

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    writeln!(out, "무엇이 궁금한가요? (:history, :reset, :quit)")?;
    prompt(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "" => {}
            ":quit" | ":q" => break,
            ":reset" => {
                session.reset();
                writeln!(out, "기록이 초기화되었습니다!")?;
            }
            ":history" => print_history(&mut out, &engine, &session)?,
            question => match engine.ask(question, &mut session, &mut rng) {
                Ok(reply) if args.json => writeln!(out, "{}", serde_json::to_string(&reply)?)?,
                Ok(reply) => writeln!(out, "챗봇: {}", engine.render(&reply))?,
                Err(e) => error!("Failed to answer {:?}: {}", question, e),
            },
        }
        prompt(&mut out)?;
    }

    Ok(())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

fn print_history<E: Embedder>(out: &mut impl Write, engine: &Engine<E>, session: &SessionMemory) -> io::Result<()> {
    if session.history().is_empty() {
        return writeln!(out, "이전 질문 기록이 없습니다.");
    }
    for (i, entry) in session.history().iter().enumerate() {
        let answer = match &entry.answer {
            Answer::Record { id, display, .. } => engine
                .config()
                .answer_field
                .as_deref()
                .and_then(|field| display.get(field))
                .and_then(|v| v.as_str())
                .unwrap_or(id.as_str())
                .to_string(),
            Answer::Canned { text } => text.clone(),
        };
        writeln!(out, "Q{}: {}\n    {}", i + 1, entry.query, answer)?;
    }
    Ok(())
}
