//! LLM Comparison CLI

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use llm_comparison::{
    analysis::group_records,
    config::Config,
    prompts::PromptLibrary,
    providers::{
        create_provider, CompletionRequest, LLMProvider, Message, OllamaClient, ProviderKind,
        ProviderNarrator, ProviderRegistry,
    },
    rag::{load_document, OllamaEmbedder, RagPipeline},
    reporting::{print_console_report, Narrator, ReportGenerator},
    runner::{ConsoleProgress, EvaluationPlan, EvaluationRunner, RunnerConfig},
    trial_log::{extract_file, read_records, records_from_cells, JsonlRecordWriter, TextLogWriter, TrialRecord},
};
use llm_labs::{ChunkStrategy, Chunker, TextAnalysisContext};

#[derive(Parser)]
#[command(name = "llm-comparison")]
#[command(about = "Compare LLM providers on latency, token usage and readability")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every provider/model/prompt combination against one question
    Run {
        /// provider=model selection, repeatable (default: enabled providers in config)
        #[arg(short, long = "model", value_name = "PROVIDER=MODEL")]
        models: Vec<String>,

        /// Comma-separated prompt template names (default: all)
        #[arg(short, long)]
        prompts: Option<String>,

        /// TOML file with additional prompt templates
        #[arg(long)]
        prompt_file: Option<PathBuf>,

        /// The user question (read from stdin when omitted)
        #[arg(short, long)]
        question: Option<String>,

        /// Generate a report after the run
        #[arg(long)]
        report: bool,

        /// Skip the narrative section of the report
        #[arg(long)]
        no_narrate: bool,

        /// Per-trial timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Chat with one provider using a prompt template
    Chat {
        /// Provider name (groq, gemini, ollama)
        #[arg(short, long)]
        provider: String,

        /// Model (default: the provider's configured default)
        #[arg(short, long)]
        model: Option<String>,

        /// Prompt template name
        #[arg(long, default_value = "zero_shot")]
        prompt: String,

        /// TOML file with additional prompt templates
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },

    /// Build a report from a trial log or a JSON Lines records file
    Report {
        /// Path to the log (`.log`) or records (`.jsonl`) file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// The question the trials answered
        #[arg(short, long, default_value = "")]
        question: String,

        /// Output directory for the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the narrative section
        #[arg(long)]
        no_narrate: bool,
    },

    /// Print readability scores of a text
    Score {
        /// Text to score
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Chunk a document, embed it and rank chunks against a query
    Rag {
        /// Document to search (.txt or .md)
        #[arg(short, long)]
        document: PathBuf,

        /// Query to rank chunks against
        #[arg(short, long)]
        query: String,

        /// Chunking strategies (token, tiktoken, char, recursive, sentence); default: all
        #[arg(short, long)]
        strategy: Vec<String>,

        /// Chunk size (default: per strategy)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunk overlap (default: per strategy)
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Number of chunks to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List available prompt templates
    ListPrompts {
        /// TOML file with additional prompt templates
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },

    /// List models of a provider
    ListModels {
        /// Provider name
        #[arg(short, long, default_value = "ollama")]
        provider: String,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "llm-comparison.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("llm_comparison=debug,llm_labs=debug,info")
    } else {
        EnvFilter::new("llm_comparison=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Run {
            models,
            prompts,
            prompt_file,
            question,
            report,
            no_narrate,
            timeout_ms,
        } => {
            run_evaluation(&config, models, prompts, prompt_file, question, report, no_narrate, timeout_ms).await?;
        }

        Commands::Chat {
            provider,
            model,
            prompt,
            prompt_file,
        } => {
            chat(&config, &provider, model, &prompt, prompt_file).await?;
        }

        Commands::Report {
            input,
            question,
            output,
            no_narrate,
        } => {
            report_from_file(&config, input, &question, output, no_narrate).await?;
        }

        Commands::Score { text, file } => {
            score_text(&config, text, file)?;
        }

        Commands::Rag {
            document,
            query,
            strategy,
            chunk_size,
            chunk_overlap,
            top_k,
        } => {
            run_rag(&config, &document, &query, strategy, chunk_size, chunk_overlap, top_k).await?;
        }

        Commands::ListPrompts { prompt_file } => {
            list_prompts(prompt_file)?;
        }

        Commands::ListModels { provider } => {
            list_models(&config, &provider).await?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

fn analysis_context(config: &Config) -> Result<TextAnalysisContext, Box<dyn std::error::Error>> {
    Ok(TextAnalysisContext::new()?.with_token_limit(config.analysis.token_limit))
}

fn load_prompts(prompt_file: Option<PathBuf>) -> Result<PromptLibrary, Box<dyn std::error::Error>> {
    let mut library = PromptLibrary::builtin();
    if let Some(path) = prompt_file {
        library.load_custom(path)?;
    }
    Ok(library)
}

/// Parse `provider=model` selections into an ordered plan
fn parse_plan(selections: &[String]) -> Result<EvaluationPlan, Box<dyn std::error::Error>> {
    let mut plan = EvaluationPlan::new();
    for selection in selections {
        let (provider, model) = selection
            .split_once('=')
            .ok_or_else(|| format!("Expected PROVIDER=MODEL, got '{}'", selection))?;
        let kind: ProviderKind = provider.parse()?;
        let model = model.trim();
        if model.is_empty() {
            return Err(format!("Missing model in '{}'", selection).into());
        }
        let models = plan.entry(kind.as_str().to_string()).or_default();
        if !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    Ok(plan)
}

fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn build_narrator(config: &Config) -> Option<ProviderNarrator> {
    let report = &config.report;
    let narrator = report
        .narrator_provider
        .parse::<ProviderKind>()
        .and_then(|kind| ProviderRegistry::for_kinds(&[kind], config))
        .and_then(|registry| registry.narrator(&report.narrator_provider, &report.narrator_model));
    match narrator {
        Ok(narrator) => Some(narrator),
        Err(e) => {
            tracing::warn!("Narration disabled: {}", e);
            None
        }
    }
}

async fn write_report(
    config: &Config,
    records: &[TrialRecord],
    question: &str,
    output_dir: Option<PathBuf>,
    narrate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let narrator = if narrate && config.report.narrate {
        build_narrator(config)
    } else {
        None
    };

    print_console_report(&group_records(records));

    let generator = ReportGenerator::new(output_dir.unwrap_or_else(|| config.report.output_dir.clone()))
        .with_json_summary(config.report.json_summary);
    let report = generator
        .generate(records, question, narrator.as_ref().map(|n| n as &dyn Narrator))
        .await?;

    println!("{}", report.text);
    println!("Report saved to: {}", report.path.display());
    if let Some(summary) = &report.summary_path {
        println!("Summary saved to: {}", summary.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_evaluation(
    config: &Config,
    selections: Vec<String>,
    prompt_names: Option<String>,
    prompt_file: Option<PathBuf>,
    question: Option<String>,
    report: bool,
    no_narrate: bool,
    timeout_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== LLM Comparison ===");

    let (plan, registry) = if selections.is_empty() {
        let registry = ProviderRegistry::from_config(config);
        let mut plan = config.default_plan();
        plan.retain(|provider, _| {
            provider
                .parse::<ProviderKind>()
                .map(|kind| registry.get(kind).is_some())
                .unwrap_or(false)
        });
        (plan, registry)
    } else {
        let plan = parse_plan(&selections)?;
        let kinds = plan
            .keys()
            .map(|p| p.parse::<ProviderKind>())
            .collect::<Result<Vec<_>, _>>()?;
        let registry = ProviderRegistry::for_kinds(&kinds, config)?;
        (plan, registry)
    };

    if plan.is_empty() {
        eprintln!("Error: No providers available. Set API keys in environment.");
        eprintln!("  GROQ_API_KEY for Groq");
        eprintln!("  GEMINI_API_KEY for Gemini");
        eprintln!("  or run a local Ollama server");
        std::process::exit(1);
    }

    let library = load_prompts(prompt_file)?;
    let names: Vec<String> = prompt_names
        .map(|s| s.split(',').map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect())
        .unwrap_or_default();
    let prompts = library.select(names.as_slice())?;

    let question = match question {
        Some(q) => q,
        None => read_line("Enter your question: ")?.unwrap_or_default(),
    };
    if question.trim().is_empty() {
        eprintln!("Error: The question is empty");
        std::process::exit(1);
    }

    for (provider, models) in &plan {
        println!("{}: {}", provider, models.join(", "));
    }
    println!("Prompts: {}", prompts.keys().cloned().collect::<Vec<_>>().join(", "));
    println!();

    let ctx = analysis_context(config)?;
    let runner_config = RunnerConfig {
        timeout_ms: timeout_ms.unwrap_or(config.evaluation.timeout_ms),
    };
    let mut runner = EvaluationRunner::new(&ctx, runner_config)
        .with_sink(TextLogWriter::open(&config.evaluation.log_file)?)
        .with_sink(JsonlRecordWriter::open(&config.evaluation.records_file)?)
        .with_progress(ConsoleProgress);

    let cells = runner.run(&plan, &prompts, &question, &registry).await;

    let failed = cells.iter().filter(|c| !c.is_success()).count();
    println!();
    println!("Trials: {} ({} failed)", cells.len(), failed);
    println!("Log: {}", config.evaluation.log_file.display());
    println!("Records: {}", config.evaluation.records_file.display());

    if report {
        write_report(config, &records_from_cells(&cells), &question, None, !no_narrate).await?;
    }
    Ok(())
}

async fn chat(
    config: &Config,
    provider: &str,
    model: Option<String>,
    prompt_name: &str,
    prompt_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: ProviderKind = provider.parse()?;
    let client: Arc<dyn LLMProvider> = create_provider(kind, config.get_provider(kind))?;
    let model = model.unwrap_or_else(|| client.default_model().to_string());
    let system = load_prompts(prompt_file)?.resolve(prompt_name)?;

    println!("Chatting with {} / {} using {} (type 'exit' or 'quit' to leave)", kind, model, prompt_name);

    let mut history: Vec<Message> = Vec::new();
    while let Some(input) = read_line("\nYou: ")? {
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        history.push(Message::user(input));
        let request = CompletionRequest::new(history.clone(), config.evaluation.max_tokens)
            .with_model(&model)
            .with_system(&system)
            .with_temperature(config.evaluation.temperature);

        match client.complete(&request).await {
            Ok(response) => {
                println!("\n{}: {}", kind, response.content);
                tracing::debug!(
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    latency_ms = response.latency_ms,
                    "Chat turn"
                );
                history.push(Message::assistant(response.content));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                history.pop();
            }
        }
    }
    Ok(())
}

async fn report_from_file(
    config: &Config,
    input: Option<PathBuf>,
    question: &str,
    output: Option<PathBuf>,
    no_narrate: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = input.unwrap_or_else(|| config.evaluation.log_file.clone());
    let is_jsonl = input
        .extension()
        .map(|e| e.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false);

    let records = if is_jsonl {
        records_from_cells(&read_records(&input)?)
    } else {
        extract_file(&input)?
    };

    println!("Loaded {} records from {}", records.len(), input.display());
    if records.is_empty() {
        eprintln!("Error: No complete trial records found");
        std::process::exit(1);
    }

    write_report(config, &records, question, output, !no_narrate).await
}

fn score_text(
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match (text, file) {
        (_, Some(path)) => std::fs::read_to_string(path)?,
        (Some(text), None) => text,
        (None, None) => io::read_to_string(io::stdin())?,
    };

    let ctx = analysis_context(config)?;
    let scored = ctx.scorer().score_with_statistics(&text);
    let stats = scored.statistics;

    println!("Text Statistics:");
    println!("{:-<50}", "");
    println!("  Sentences:     {}", stats.sentence_count);
    println!("  Words:         {}", stats.word_count);
    println!("  Syllables:     {}", stats.syllable_count);
    println!("  Polysyllables: {}", stats.polysyllable_count);
    println!("  Characters:    {}", stats.char_count);
    println!("  Tokens:        {}", ctx.token_counter().count(&text));
    println!("  Prompt type:   {}", ctx.classify(&text));

    println!("\nReadability:");
    println!("{:-<50}", "");
    for (metric, score) in scored.report.iter() {
        println!("  {:<30} {:>8}", metric.display_name(), score);
        println!("      {}", metric.interpretation());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_rag(
    config: &Config,
    document: &Path,
    query: &str,
    strategies: Vec<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = load_document(document)?;
    let strategies: Vec<ChunkStrategy> = if strategies.is_empty() {
        vec![
            ChunkStrategy::Token,
            ChunkStrategy::TokenMeasured,
            ChunkStrategy::character(),
            ChunkStrategy::recursive(),
            ChunkStrategy::Sentence,
        ]
    } else {
        strategies
            .iter()
            .map(|s| s.parse::<ChunkStrategy>())
            .collect::<Result<Vec<_>, _>>()?
    };

    let ctx = analysis_context(config)?;
    let embedder = OllamaEmbedder::new(config.rag.embedding_model.clone())
        .with_base_url(config.rag.embedding_url.clone());
    let top_k = top_k.unwrap_or(config.rag.top_k);

    println!("=== Retrieval Experiment ===");
    println!("Document: {} ({} chars)", document.display(), text.chars().count());
    println!("Query:    {}", query);

    for strategy in strategies {
        let (default_size, default_overlap) = strategy.default_sizes();
        let chunker = Chunker::new(
            strategy,
            chunk_size.or(config.rag.chunk_size).unwrap_or(default_size),
            chunk_overlap.or(config.rag.chunk_overlap).unwrap_or(default_overlap),
        )?;
        let pipeline = RagPipeline::new(chunker, top_k);

        match pipeline.run(&ctx, &text, query, &embedder).await {
            Ok(outcome) => {
                println!(
                    "\n{} (size {}, overlap {}): {} chunks",
                    outcome.strategy, outcome.chunk_size, outcome.chunk_overlap, outcome.chunk_count
                );
                println!("{:-<50}", "");
                for hit in &outcome.results {
                    println!(
                        "  #{} chunk {} cosine {:.4} euclidean {:.4} dot {:.4}",
                        hit.rank,
                        hit.similarity.index,
                        hit.similarity.cosine,
                        hit.similarity.euclidean,
                        hit.similarity.dot
                    );
                    let preview: String = hit.text.chars().take(200).collect();
                    println!("     {}", preview.replace('\n', " "));
                }
            }
            Err(e) => {
                eprintln!("\n{}: {}", pipeline.chunker().strategy(), e);
            }
        }
    }
    Ok(())
}

fn list_prompts(prompt_file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let library = load_prompts(prompt_file)?;

    println!("Available prompt templates ({}):", library.len());
    println!("{:-<50}", "");
    for name in library.names() {
        let text = library.get(name).unwrap_or_default();
        let first_line = text.lines().next().unwrap_or_default();
        let preview: String = first_line.chars().take(70).collect();
        println!("  {:<24} {}", name, preview);
    }
    println!("\n  persona:<role> selects the persona template with a custom role");
    Ok(())
}

async fn list_models(config: &Config, provider: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind: ProviderKind = provider.parse()?;
    match kind {
        ProviderKind::Ollama => {
            let mut client = OllamaClient::new();
            if let Some(url) = config.get_provider(kind).and_then(|p| p.base_url.clone()) {
                client = client.with_base_url(url);
            }
            let models = client.list_models().await?;
            println!("Local Ollama models ({}):", models.len());
            for model in models {
                println!("  {}", model);
            }
        }
        _ => {
            if let Some(pc) = config.get_provider(kind) {
                println!("Configured {} models:", kind);
                for model in &pc.models {
                    println!("  {}", model);
                }
            }
            println!("Model catalogue: {}", kind.models_url());
            match create_provider(kind, config.get_provider(kind)) {
                Ok(client) => {
                    let reachable = client.health_check().await.unwrap_or(false);
                    println!("API reachable: {}", if reachable { "yes" } else { "no" });
                }
                Err(e) => println!("API not configured: {}", e),
            }
        }
    }
    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
