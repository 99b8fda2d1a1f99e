mod config;
mod effects;
mod logging;

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use collector_client::{ClientHandle, PollSettings};
use collector_core::{update, Msg, TaskState, TaskViewModel};

use config::TaskFile;
use effects::EffectRunner;

fn main() {
    logging::initialize(logging::LogDestination::File);

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "task.ron".to_string());
    let task_file = match TaskFile::load(Path::new(&path)) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("cannot load task file {path}: {err}");
            std::process::exit(1);
        }
    };

    let client = match ClientHandle::with_http(
        task_file.gateway_settings(),
        PollSettings::default(),
        task_file.stats_interval(),
    ) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("cannot start the submission client: {err}");
            std::process::exit(1);
        }
    };
    let runner = EffectRunner::new(client);
    let mut state = TaskState::new(task_file.task_config());

    let (input_tx, input_rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("enter one url per line (url<TAB>label to override the label)");
    render(&state.view());

    loop {
        let mut advanced = false;

        if let Ok(line) = input_rx.try_recv() {
            let (url, label) = split_input(&line, task_file.label.as_deref());
            let (next, effects) = update(state, Msg::AddSample { url, label });
            state = next;
            if let Some(urls) = runner.run(effects) {
                finish(&urls);
                return;
            }
            advanced = true;
        }

        while let Some(msg) = runner.next_msg() {
            let (next, effects) = update(state, msg);
            state = next;
            if let Some(urls) = runner.run(effects) {
                finish(&urls);
                return;
            }
            advanced = true;
        }

        if advanced {
            render(&state.view());
        } else {
            thread::sleep(Duration::from_millis(20));
        }
    }
}

fn split_input(line: &str, default_label: Option<&str>) -> (String, Option<String>) {
    match line.split_once('\t') {
        Some((url, label)) if !label.trim().is_empty() => {
            (url.to_string(), Some(label.trim().to_string()))
        }
        _ => (line.to_string(), default_label.map(ToOwned::to_owned)),
    }
}

fn render(view: &TaskViewModel) {
    let target = view
        .min_required
        .map(|min| min.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{:?}] gathered {}/{target} score {}",
        view.phase, view.gathered, view.total_score
    );
    for row in &view.rows {
        match &row.detail {
            Some(detail) => println!("  {} {} ({detail})", row.state, row.url),
            None => println!("  {} {} [{} pts]", row.state, row.url, row.score),
        }
    }
    if let Some(error) = &view.input_error {
        println!("  ! {error}");
    }
    if let Some(stats) = view.stats {
        println!(
            "  session: {} points, {} awaiting verification",
            stats.points_gathered, stats.pending_verifications
        );
    }
    if !view.add_enabled {
        println!("  (adding disabled)");
    }
}

/// The boundary back to the hosting platform: the accepted set goes out
/// and the process ends.
fn finish(urls: &[String]) {
    println!("task complete; submitting {} urls:", urls.len());
    for url in urls {
        println!("  {url}");
    }
}
