use slotsim::logger::{sanitize_filename, ConsoleReceiver, FileReceiver, LogEvent, Logger};
use slotsim::scenarios::get_scenario_catalog;
use slotsim::utils::{self, RAND_SEED, TOTAL_SIMULATION_RUNS};
use slotsim::{log, logln};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

fn print_usage(program: &str) {
    eprintln!("Usage: {} <scenario|all> [iterations] [start_iteration] [--fastbreak] [--verbose rounds]", program);
    eprintln!("Available scenarios:");
    for s in get_scenario_catalog() {
        eprintln!("  - {}", s.short_name);
    }
}

fn parse_number(args: &[String], index: usize, what: &str, default: u64) -> u64 {
    match args.get(index) {
        None => default,
        Some(arg) => match arg.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: Invalid {} parameter '{}'. Expected a number.", what, arg);
                std::process::exit(1);
            }
        },
    }
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Filter out --verbose and --fastbreak
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if raw_args.get(i + 1).map(String::as_str) == Some("rounds") {
                utils::VERBOSE_ROUNDS.store(true, Ordering::Relaxed);
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        args.push(arg.clone());
    }

    let program = args.first().cloned().unwrap_or_else(|| "slotsim".to_string());
    let scenario_arg = match args.get(1) {
        Some(arg) => arg.clone(),
        None => {
            print_usage(&program);
            std::process::exit(1);
        }
    };
    let iterations = parse_number(&args, 2, "iterations", 1);
    let start_iteration = parse_number(&args, 3, "start iteration", 0);

    let all_scenarios = get_scenario_catalog();
    let scenarios: Vec<_> = if scenario_arg == "all" {
        all_scenarios
    } else {
        match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
            Some(scenario) => vec![scenario.clone()],
            None => {
                eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                print_usage(&program);
                std::process::exit(1);
            }
        }
    };

    // Single runs of a single scenario also show the individual validations
    let mut logger = Logger::new();
    if scenario_arg != "all" && iterations == 1 {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
    } else {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
    }
    let summary_receiver_id = match FileReceiver::new(&PathBuf::from("log/summary.log"), vec![LogEvent::Validation]) {
        Ok(receiver) => Some(logger.add_receiver(receiver)),
        Err(e) => {
            eprintln!("Warning: cannot write log/summary.log: {}", e);
            None
        }
    };

    TOTAL_SIMULATION_RUNS.store(0, Ordering::Relaxed);
    if iterations > 1 {
        logln!(logger, LogEvent::Validation, "Running '{}' {} times...\n", scenario_arg, iterations);
    } else {
        logln!(logger, LogEvent::Validation, "Running '{}'...\n", scenario_arg);
    }

    let mut failures = 0;
    'scenarios: for scenario in &scenarios {
        log!(logger, LogEvent::Validation, "{}: ", scenario.short_name);

        let scenario_receiver_id = FileReceiver::new(
            &PathBuf::from(format!("log/{}/scenario.log", sanitize_filename(scenario.short_name))),
            vec![LogEvent::Scenario, LogEvent::Simulation],
        )
        .ok()
        .map(|receiver| logger.add_receiver(receiver));

        for i in start_iteration..(start_iteration + iterations) {
            if iterations > 1 {
                log!(logger, LogEvent::Validation, "[{}/{}] ", i - start_iteration + 1, iterations);
            }

            RAND_SEED.store(i, Ordering::Relaxed);

            match (scenario.run)(scenario.short_name, &mut logger) {
                Ok(()) => {
                    logln!(logger, LogEvent::Validation, "✓ PASSED");
                }
                Err(e) => {
                    failures += 1;
                    logln!(logger, LogEvent::Validation, "✗ FAILED: {}", e);
                    if fastbreak {
                        if let Some(id) = scenario_receiver_id {
                            logger.remove_receiver(id);
                        }
                        logln!(logger, LogEvent::Validation, "\nStopping at seed {} (--fastbreak enabled)", i);
                        break 'scenarios;
                    }
                }
            }
            let _ = logger.flush();
        }

        if let Some(id) = scenario_receiver_id {
            logger.remove_receiver(id);
        }
    }

    logln!(logger, LogEvent::Validation, "\nTotal simulation runs completed: {}", TOTAL_SIMULATION_RUNS.load(Ordering::Relaxed));
    if let Some(id) = summary_receiver_id {
        logger.remove_receiver(id);
    }
    if failures > 0 {
        std::process::exit(1);
    }
}
