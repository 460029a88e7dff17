use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use flowlens::correlation::triage_location::{selected_issue, stream_filter};
use flowlens::correlation::{evidence_streams, issue_stream, severity_label, FlowQuery, SeverityBand, TriageFilter, TriageView};
use flowlens::utils::format::{format_bytes, format_duration_ms, format_relative_time};
use flowlens::view::{FilterKey, FilterPatch, Location, PacketsView};
use flowlens::{resolve_active_stream, sort_packets, SortDirection, SortKey, SortState, ViewConfig};
use serde::de::DeserializeOwned;
use shared::{status_label, FlowSummary, Issue, IssueDetail, PacketPage};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs;
use std::path::{Path, PathBuf};

const RULE: &str = "═══════════════════════════════════════════════════════";

#[derive(Parser)]
#[command(name = "flowlens-cli")]
#[command(about = "Inspect packet and triage views from saved backend responses", long_about = None)]
struct Cli {
    /// View configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageMove {
    Next,
    Prev,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one packets page under the filters in a query string
    Packets {
        /// Packets page JSON ({"packets": [...], "total_count": N})
        #[arg(short, long)]
        page: PathBuf,

        /// Location query string
        #[arg(short, long, default_value = "")]
        query: String,

        /// Sort key (index, length, stream)
        #[arg(short, long, default_value = "index")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Correlate issues and flows for a job
    Triage {
        /// Issues JSON array
        #[arg(short, long)]
        issues: PathBuf,

        /// Flows JSON array
        #[arg(short, long)]
        flows: PathBuf,

        /// Location query string (reads `stream` and `issue`)
        #[arg(short, long, default_value = "")]
        query: String,

        /// Only issues of this type
        #[arg(short = 't', long = "type")]
        issue_type: Option<String>,

        /// Only issues in this band (HIGH, MED, LOW)
        #[arg(long)]
        severity: Option<String>,

        /// Evidence JSON for the selected issue ({"evidence": [...]})
        #[arg(short, long)]
        detail: Option<PathBuf>,
    },

    /// Move one page forward or back
    Page {
        #[arg(value_enum)]
        direction: PageMove,

        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Apply a quick filter (key=value pairs, e.g. src_ip=10.0.0.1)
    Quick {
        #[arg(required = true)]
        set: Vec<String>,

        #[arg(short, long, default_value = "")]
        query: String,

        /// Discard the other active filters
        #[arg(long)]
        replace: bool,
    },

    /// Drop every packet filter, keeping unrelated keys
    Clear {
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let config = flowlens::config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Packets { page, query, sort, desc } => show_packets(&config, &page, &query, &sort, desc)?,
        Commands::Triage { issues, flows, query, issue_type, severity, detail } => {
            show_triage(&config, &issues, &flows, &query, issue_type, severity, detail.as_deref())?
        }
        Commands::Page { direction, query } => {
            let view = PacketsView::from_location(Location::parse(&query), &config);
            let next = match direction {
                PageMove::Next => view.next_page(),
                PageMove::Prev => view.prev_page(),
            };
            println!("{}", next);
        }
        Commands::Quick { set, query, replace } => {
            let view = PacketsView::from_location(Location::parse(&query), &config);
            let patch = parse_patch(&set)?;
            println!("{}", view.quick_filter(patch, replace));
        }
        Commands::Clear { query } => {
            let view = PacketsView::from_location(Location::parse(&query), &config);
            println!("{}", view.reset());
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn parse_patch(pairs: &[String]) -> Result<FilterPatch> {
    let mut patch = FilterPatch::default();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {:?}", pair))?;
        let key: FilterKey = key
            .parse()
            .map_err(|_| anyhow!("unknown filter key {:?}", key))?;
        if !patch.set(key, value) {
            return Err(anyhow!("invalid value {:?} for {}", value, key.query_key()));
        }
    }
    Ok(patch)
}

fn print_header(title: &str, subtitle: &str) {
    println!("\n{}", RULE.cyan());
    println!("{} {}", title.bright_cyan().bold(), subtitle.white());
    println!("{}\n", RULE.cyan());
}

fn show_packets(config: &ViewConfig, page_path: &Path, query: &str, sort: &str, desc: bool) -> Result<()> {
    let page: PacketPage = read_json(page_path)?;
    let view = PacketsView::from_location(Location::parse(query), config);

    let key: SortKey = sort.parse().map_err(|_| anyhow!("unknown sort key {:?}", sort))?;
    let state = SortState {
        key,
        direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
    };

    print_header("Packets", &format!("- sorted by {}", key));

    let pills = view.pills();
    if !pills.is_empty() {
        let rendered: Vec<String> = pills
            .iter()
            .map(|pill| format!("{} {}", format!("{}:", pill.label).bright_blue(), pill.value))
            .collect();
        println!("{} {}", "Filters:".bright_blue().bold(), rendered.join("  "));
    }

    let status = view.status(page.packets.len() as u64, page.total_count);
    println!(
        "{} {}-{} of {} (page {}/{})",
        "Showing:".bright_blue(),
        status.showing_start,
        status.showing_end,
        page.total_count,
        status.current_page,
        status.total_pages
    );

    match resolve_active_stream(view.filters().stream.as_deref(), &page.packets) {
        Some(stream) => println!("{} {}", "Active stream:".bright_blue(), stream.to_string().bright_white().bold()),
        None => println!("{}", "No single stream on this page.".bright_black()),
    }
    println!();

    if page.packets.is_empty() {
        println!("{}", "No packets matching criteria.".yellow());
        return Ok(());
    }

    let base_ts = page.packets.first().map(|p| p.timestamp.as_str());
    for packet in sort_packets(&page.packets, state) {
        let stream = packet.stream_id.map_or_else(|| "—".to_string(), |s| s.to_string());
        let tag = status_label(&packet.error_tags)
            .map(|label| format!(" [{}]", label).red().bold().to_string())
            .unwrap_or_default();
        println!(
            "{:>6} {:>9} {}:{} → {}:{} {:<5} {:>6} #{}{}",
            packet.index,
            format_relative_time(&packet.timestamp, base_ts),
            packet.src_ip,
            packet.src_port,
            packet.dst_ip,
            packet.dst_port,
            packet.protocol,
            packet.length,
            stream,
            tag
        );
    }

    let mut nav = Vec::new();
    if status.can_prev {
        nav.push(format!("prev: {}", view.prev_page()));
    }
    if status.can_next {
        nav.push(format!("next: {}", view.next_page()));
    }
    if !nav.is_empty() {
        println!();
        for line in nav {
            println!("{}", line.bright_black());
        }
    }
    Ok(())
}

fn colored_band(severity: Option<u32>) -> ColoredString {
    let label = severity_label(severity);
    match label {
        "HIGH" => label.red().bold(),
        "MED" => label.yellow().bold(),
        "LOW" => label.green().bold(),
        _ => label.bright_black(),
    }
}

fn show_triage(
    config: &ViewConfig,
    issues_path: &Path,
    flows_path: &Path,
    query: &str,
    issue_type: Option<String>,
    severity: Option<String>,
    detail_path: Option<&Path>,
) -> Result<()> {
    let issues: Vec<Issue> = read_json(issues_path)?;
    let flows: Vec<FlowSummary> = read_json(flows_path)?;
    let location = Location::parse(query);

    let severity = severity
        .map(|s| s.parse::<SeverityBand>().map_err(|_| anyhow!("unknown severity {:?}", s)))
        .transpose()?;
    let filter = TriageFilter {
        issue_type,
        severity,
        stream: stream_filter(&location).map(str::to_string),
    };

    let flow_query = FlowQuery::from_inputs("", "", "", filter.stream.as_deref().unwrap_or(""), config.flow_query_limit);
    log::debug!("flow request params: {:?}", flow_query.params());

    let view = TriageView::build(&issues, &flows, &filter);

    print_header("Triage", &format!("- {} issues, {} flows", view.issues.len(), view.flows.len()));
    println!("{} {}", "Issue types:".bright_blue(), view.issue_types.join(", "));
    println!();

    let selected = selected_issue(&location).and_then(|id| id.parse::<u64>().ok());
    if view.issues.is_empty() {
        println!("{}", "No issues found for this job.".yellow());
    }
    for issue in &view.issues {
        let marker = if Some(issue.id) == selected { ">".bright_cyan().bold() } else { " ".normal() };
        println!(
            "{} {} {} {}",
            marker,
            colored_band(Some(issue.severity)),
            issue.title.bright_white().bold(),
            issue.issue_type.bright_black()
        );
        if let Some(flow) = &issue.primary_flow {
            println!("    {} {}", "Endpoint:".bright_blue(), flow.endpoint());
        }
        if let Some(stream) = issue_stream(issue) {
            println!("    {} {}", "Stream:".bright_blue(), stream);
        }
        if !issue.summary.is_empty() {
            println!("    {}", issue.summary);
        }
    }

    if let Some(path) = detail_path {
        let detail: IssueDetail = read_json(path)?;
        show_evidence(&detail, selected);
    }

    println!("\n{}", "Flows".bright_cyan().bold());
    if view.flows.is_empty() {
        println!("{}", "No matching flows.".yellow());
    }
    for row in &view.flows {
        let flow = row.flow;
        let stream = flow.tcp_stream.map_or_else(|| "—".to_string(), |s| s.to_string());
        println!(
            "  {:<5} {} {:<4} stream {:>4} rtt {:>9} dur {:>9} retrans {} {}",
            colored_band(row.max_severity),
            flow.endpoint(),
            flow.protocol,
            stream,
            format_duration_ms(flow.handshake_rtt_ms_estimate),
            format_duration_ms(flow.duration_ms),
            flow.tcp_retransmissions,
            format_bytes(flow.bytes_client_to_server + flow.bytes_server_to_client).bright_black()
        );
    }
    println!();
    Ok(())
}

fn show_evidence(detail: &IssueDetail, selected: Option<u64>) {
    let title = selected.map_or_else(|| "Evidence".to_string(), |id| format!("Evidence for issue {}", id));
    println!("\n{}", title.bright_cyan().bold());
    if detail.evidence.is_empty() {
        println!("{}", "No evidence recorded.".yellow());
        return;
    }
    for ev in &detail.evidence {
        let endpoint = ev.flow.as_ref().map_or_else(|| "unknown flow".to_string(), |flow| flow.endpoint());
        println!(
            "  packets {}-{} {}",
            ev.packet_start_index,
            ev.packet_end_index,
            endpoint.bright_black()
        );
    }
    let streams = evidence_streams(detail);
    if !streams.is_empty() {
        let rendered: Vec<String> = streams.iter().map(u64::to_string).collect();
        println!("{} {}", "Streams:".bright_blue(), rendered.join(", "));
    }
}
