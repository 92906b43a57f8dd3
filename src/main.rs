use log::{error, info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use retro_basic::output::{CLEAR_SCREEN, READY};
use retro_basic::{Executor, InterpreterConfig, MemoryStorage};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Route log records to a file; logging stays off if the file cannot be opened
fn init_log(level: LevelFilter, file_path: &Path) {
    if level == LevelFilter::Off {
        return;
    }

    let logfile = match FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}",
        )))
        .build(file_path)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("cannot open log file {}: {}", file_path.display(), e);
            return;
        }
    };

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        )
        .build(Root::builder().appender("logfile").build(level));

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("cannot start logging: {}", e);
            }
        }
        Err(e) => eprintln!("bad log configuration: {}", e),
    }
}

fn main() {
    let config = InterpreterConfig::from_env();
    init_log(config.log_level, &config.log_file);
    info!("starting with {:?}", config);

    let mut executor = match Executor::from_config(config.clone()) {
        Ok(executor) => executor,
        Err(e) => {
            error!("program directory unavailable: {}", e);
            eprintln!("?{} - PROGRAMS WILL NOT BE KEPT ON DISK", e);
            Executor::with_storage(config, Box::new(MemoryStorage::new()))
        }
    };

    println!("RETRO BASIC");
    println!("{}", READY);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        if let Some(line_number) = executor.auto_line() {
            print!("{} ", line_number);
            let _ = stdout.flush();
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("reading input failed: {}", e);
                break;
            }
            None => break,
        };

        if !executor.is_waiting_for_input() && !executor.is_auto_mode() {
            let command = line.trim().to_ascii_uppercase();
            if command == "EXIT" || command == "QUIT" {
                break;
            }
        }

        executor.enter_line(&line);

        let output = executor.take_output();
        let count = output.len();
        for (i, text) in output.into_iter().enumerate() {
            let is_prompt = i + 1 == count && executor.is_waiting_for_input();
            if text == CLEAR_SCREEN {
                print!("\x1b[2J\x1b[H");
            } else if is_prompt {
                print!("{}", text);
            } else {
                println!("{}", text);
            }
        }
        let _ = stdout.flush();
    }

    info!("session ended");
}
