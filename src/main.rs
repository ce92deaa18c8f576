// Console front-end for the claims analytics core.
//
// - Option [1] loads the four dataset files and prints load diagnostics.
// - Option [2] builds the trend, breakdown, top-N and detail reports, exports
//   them as CSV and writes a JSON summary.
// - Option [3] plays the therapy-class ranking animation once through the
//   configured periods.
use claims_dashboard::config::DashboardConfig;
use claims_dashboard::delta::ranking_frame;
use claims_dashboard::growth::compute_growth_by_entity;
use claims_dashboard::loader::{self, DataStore};
use claims_dashboard::metrics::{derive_metrics, MetricId};
use claims_dashboard::output;
use claims_dashboard::playback::Animation;
use claims_dashboard::ranking::{rank_top_n, RankQuery};
use claims_dashboard::reports;
use claims_dashboard::types::{Dataset, Period};
use claims_dashboard::util;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

// Loaded once, reused by every report run in the session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<DataStore>,
}

/// `None` once stdin is closed.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    util::read_answer(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Ask for a metric; an empty answer means Cost.
fn read_metric() -> Option<MetricId> {
    loop {
        let answer = prompt("Metric (Claimants, Volumes, Cost, Cost_Per_Claimant, ...) [Cost]: ")?;
        if answer.is_empty() {
            return Some(MetricId::Cost);
        }
        match answer.parse::<MetricId>() {
            Ok(m) => return Some(m),
            Err(e) => println!("{}", e),
        }
    }
}

/// Ask which dataset the detail table shows; an empty answer means generic.
fn read_dataset() -> Option<Dataset> {
    loop {
        let answer = prompt("Detail table dataset (province, generic, therapy) [generic]: ")?;
        if answer.is_empty() {
            return Some(Dataset::Generic);
        }
        match answer.parse::<Dataset>() {
            Ok(d) => return Some(d),
            Err(e) => println!("{}", e),
        }
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn loaded_data() -> Option<DataStore> {
    let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.data.clone()
}

fn handle_load(config: &DashboardConfig) {
    match DataStore::load_dir(&config.data_dir) {
        Ok((store, load_reports)) => {
            for (dataset, r) in &load_reports {
                println!(
                    "{}: {} rows loaded ({} skipped, {} duplicates rejected)",
                    dataset.file_name(),
                    util::format_int(r.loaded_rows),
                    util::format_int(r.parse_errors),
                    util::format_int(r.duplicates)
                );
            }
            let insurers = loader::insurers(store.get(Dataset::Annual));
            println!("Insurers available: {}\n", insurers.join(", "));
            let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
            state.data = Some(store);
        }
        Err(e) => {
            error!("load failed: {}", e);
            eprintln!("Failed to load data from {}: {}\n", config.data_dir.display(), e);
        }
    }
}

fn export<T: serde::Serialize>(config: &DashboardConfig, file: &str, rows: &[T]) {
    if let Err(e) = output::write_csv(&config.output_dir.join(file), rows) {
        error!("write error for {}: {}", file, e);
    }
}

fn print_series<F>(series: &reports::TrendSeries, fmt: F)
where
    F: Fn(f64) -> String,
{
    let points: Vec<String> = series
        .points
        .iter()
        .map(|(p, v)| format!("{} {}", p, fmt(*v)))
        .collect();
    println!("  {:<24} {}", series.name, points.join(" | "));
}

/// Base period and up to two earlier periods to compare it with.
fn comparison_window(periods: &[Period]) -> Option<(Period, Vec<Period>)> {
    let (&base, earlier) = periods.split_last()?;
    let compare = earlier.iter().rev().take(2).copied().collect();
    Some((base, compare))
}

fn handle_generate_reports(config: &DashboardConfig) {
    let Some(data) = loaded_data() else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };
    let group = config.group.key();
    let Some(metric) = read_metric() else {
        return;
    };
    println!("\nGenerating reports for {}...\n", config.group);

    let annual = derive_metrics(data.get(Dataset::Annual));
    let growth = compute_growth_by_entity(&annual);
    let annual_rows = reports::annual_trend_rows(&growth, group);
    output::preview_table(
        &format!("Annual Trends - {}", config.group),
        Some("growth against the previous year"),
        &annual_rows,
        annual_rows.len(),
    );
    export(config, "annual_trends.csv", &annual_rows);

    if let Some(latest) = reports::latest_summary(&growth, group) {
        println!("Latest Year Summary ({})", latest.record.period);
        for m in MetricId::ALL {
            println!(
                "  {:<20} {:>16} {}",
                m.label(),
                util::format_metric(m, m.value(&latest.record)),
                util::format_growth(latest.growth.get(m))
            );
        }
    }

    println!("\nNormalized Trends (First Year = 1)");
    let base_metrics = [MetricId::Claimants, MetricId::Volumes, MetricId::Cost];
    for series in reports::normalized_trend(&annual, group, group, &base_metrics) {
        print_series(&series, |v| util::format_number(v, 2));
    }

    let provinces = derive_metrics(data.get(Dataset::Province));
    if let Some(&latest) = loader::periods(data.get(Dataset::Province)).last() {
        let rows = reports::period_breakdown_rows(&provinces, group, latest, metric);
        output::preview_table(
            &format!("{} by Province in {} - {}", metric, latest, config.group),
            Some("every province, highest first"),
            &rows,
            rows.len(),
        );
        export(config, "province_breakdown.csv", &rows);
    }

    println!("\nTop {} Provinces Trend - {}", config.trend_top_k, metric);
    let top_provinces = reports::top_k_trend(&provinces, group, metric, config.trend_top_k);
    for series in &top_provinces {
        print_series(series, |v| util::format_metric(metric, v));
    }
    if let Some(leader) = top_provinces.first() {
        if let Some(t) = reports::entity_trend(&provinces, &annual, group, &leader.name, metric) {
            println!("\n{} vs Overall Average", leader.name);
            print_series(&t.entity, |v| util::format_metric(metric, v));
            print_series(&t.benchmark, |v| util::format_metric(metric, v));
            let growth: Vec<String> = t
                .growth
                .iter()
                .filter_map(|(p, g)| g.and_then(util::finite).map(|g| format!("{} {:.1}%", p, g)))
                .collect();
            println!("  {:<24} {}", "Growth", growth.join(" | "));
        }
    }

    for (dataset, file) in [
        (Dataset::Generic, "top_generic_names.csv"),
        (Dataset::Therapy, "top_therapy_classes.csv"),
    ] {
        let records = derive_metrics(data.get(dataset));
        let periods = loader::periods(data.get(dataset));
        let Some((base, compare)) = comparison_window(&periods) else {
            warn!("{} has no periods to rank", dataset.file_name());
            continue;
        };
        let query = RankQuery::new(group, base, metric)
            .top(config.top_n)
            .compare_with(compare);
        let top = rank_top_n(&records, &query);
        let rows = reports::top_entity_rows(&top, metric);
        output::preview_table(
            &format!(
                "Top {} {} by Cost - {} ({}) - {}",
                config.top_n,
                dataset.entity_label(),
                metric,
                base,
                config.group
            ),
            Some("ascending by the selected metric; share is of total cost"),
            &rows,
            rows.len(),
        );
        export(config, file, &rows);

        if dataset == Dataset::Therapy {
            println!("Movement of Top {} Therapy Classes - {}", config.top_n, metric);
            for series in reports::movement_series(&records, group, base, metric, config.top_n) {
                print_series(&series, |v| util::format_metric(metric, v));
            }
            println!();
        }
    }

    if let Some(dataset) = read_dataset() {
        let records = derive_metrics(data.get(dataset));
        if let Some(&latest) = loader::periods(data.get(dataset)).last() {
            let rows = reports::period_detail_rows(&records, group, latest);
            output::preview_table(
                &format!("{} Detail - {} ({})", dataset.entity_label(), latest, config.group),
                None,
                &rows,
                rows.len(),
            );
            let stem = dataset.file_name().trim_end_matches(".csv");
            export(config, &format!("{}_detail.csv", stem), &rows);
        }
    }

    let summary = reports::generate_summary(&data, group);
    let summary_path = config.output_dir.join("summary.json");
    if let Err(e) = output::write_json(&summary_path, &summary) {
        error!("write error for summary: {}", e);
    }
    info!("reports generated for {}", config.group);
}

fn handle_play_animation(config: &DashboardConfig) {
    let Some(data) = loaded_data() else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };
    let Some(metric) = read_metric() else {
        return;
    };
    let group = config.group.key();
    let therapy = derive_metrics(data.get(Dataset::Therapy));
    let periods = config.playback_periods();

    let mut animation = Animation::new();
    animation.toggle();
    for step in 0..periods.len() {
        if step > 0 {
            thread::sleep(Duration::from_millis(config.tick_ms));
            animation.tick();
        }
        let Some(period) = animation.current_period(&periods) else {
            break;
        };
        let frame = ranking_frame(
            &therapy,
            group,
            metric,
            period,
            animation.previous_period(&periods),
            config.ranking_depth,
        );
        output::preview_table(
            &format!("Therapy Class Rankings by {} in {} - {}", metric, period, config.group),
            None,
            &frame.rows(),
            config.ranking_depth,
        );
    }
    let stopped = animation.toggle();
    info!("animation stopped after {} ticks", stopped.tick_count);
    if let Some(first) = animation.current_period(&periods) {
        println!("Animation stopped. Year: {}\n", first);
    }
}

fn main() {
    env_logger::init();
    let config = match DashboardConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    info!("using data directory {}", config.data_dir.display());

    loop {
        println!("Claims Dashboard ({})", config.group);
        println!("[1] Load the data files");
        println!("[2] Generate Reports");
        println!("[3] Play Therapy Ranking Animation\n");
        let Some(choice) = read_choice() else {
            println!("\nInput closed. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&config),
            "2" | "3" => {
                println!();
                if choice == "2" {
                    handle_generate_reports(&config);
                } else {
                    handle_play_animation(&config);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
