//! Execution engine
//!
//! [`Executor`] owns all interpreter state. Raw input lines enter through
//! [`Executor::enter_line`], which routes them to the program store, AUTO
//! capture, a pending INPUT or immediate execution. RUN drives a fetch/execute
//! loop over the stored program until it halts, fails or suspends on INPUT.

mod expressions;
mod statements;

use crate::config::InterpreterConfig;
use crate::error::{BasicError, Result};
use crate::filesystem::{DirectoryStorage, MemoryStorage, ProgramStorage};
use crate::memory::MemoryManager;
use crate::output::{OutputBuffer, READY};
use crate::parser::{parse_statement, DataValue, Target};
use crate::program::ProgramStore;
use crate::tokenizer::{parse_line_number, split_line_number};
use crate::variables::{is_string_name, Value, VariableStore};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where the run loop fetches its next line from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCounter {
    /// Not mid-program
    Halted,
    /// Run exactly this line next
    At(u32),
    /// Run the first line after this one
    After(u32),
}

/// Control transfer requested by the statement just executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    /// Continue at this line (GOTO, GOSUB, ON, RUN n)
    Goto(u32),
    /// Continue after this line (RETURN, NEXT, RUN)
    ResumeAfter(u32),
    /// Stop the program (END)
    Halt,
}

/// One active FOR loop
#[derive(Debug, Clone, PartialEq)]
pub struct LoopState {
    pub variable: String,
    pub end: f64,
    pub step: f64,
    /// Line of the FOR statement itself
    pub anchor: u32,
}

/// AUTO line numbering state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AutoState {
    active: bool,
    next_line: u32,
    increment: u32,
}

/// BASIC interpreter engine
#[derive(Debug)]
pub struct Executor {
    config: InterpreterConfig,
    variables: VariableStore,
    memory: MemoryManager,
    program: ProgramStore,
    loop_stack: Vec<LoopState>,
    // Call-site line numbers pushed by GOSUB
    gosub_stack: Vec<u32>,
    data_pool: Vec<DataValue>,
    data_cursor: usize,
    pc: ProgramCounter,
    transfer: Option<Transfer>,
    // Line being executed; None for immediate commands
    current_line: Option<u32>,
    running: bool,
    waiting_for_input: bool,
    pending_input: Option<Target>,
    error: Option<String>,
    output: OutputBuffer,
    auto: AutoState,
    storage: Box<dyn ProgramStorage>,
    rng: StdRng,
    last_rnd: f64,
}

impl Executor {
    /// Create an executor with default settings and in-memory program storage
    pub fn new() -> Self {
        Self::with_storage(InterpreterConfig::default(), Box::new(MemoryStorage::new()))
    }

    /// Create an executor from a configuration, opening the program directory if one is set
    pub fn from_config(config: InterpreterConfig) -> Result<Self> {
        let storage: Box<dyn ProgramStorage> = match &config.program_dir {
            Some(dir) => Box::new(DirectoryStorage::new(dir)?),
            None => Box::new(MemoryStorage::new()),
        };
        Ok(Self::with_storage(config, storage))
    }

    /// Create an executor with an explicit storage backend
    pub fn with_storage(config: InterpreterConfig, storage: Box<dyn ProgramStorage>) -> Self {
        let rng = match config.rnd_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let auto = AutoState {
            active: false,
            next_line: config.auto_start,
            increment: config.auto_increment,
        };

        Self {
            config,
            variables: VariableStore::new(),
            memory: MemoryManager::new(),
            program: ProgramStore::new(),
            loop_stack: Vec::new(),
            gosub_stack: Vec::new(),
            data_pool: Vec::new(),
            data_cursor: 0,
            pc: ProgramCounter::Halted,
            transfer: None,
            current_line: None,
            running: false,
            waiting_for_input: false,
            pending_input: None,
            error: None,
            output: OutputBuffer::new(),
            auto,
            storage,
            rng,
            last_rnd: 0.0,
        }
    }

    /// Feed one raw line of input.
    ///
    /// While an INPUT is pending the line is the value; in AUTO mode it is
    /// captured as the next program line; a leading line number edits the
    /// program; anything else runs as an immediate command.
    pub fn enter_line(&mut self, raw: &str) {
        if self.waiting_for_input {
            self.provide_input(raw);
            return;
        }

        self.error = None;

        if self.auto.active {
            self.capture_auto_line(raw);
            return;
        }

        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        match split_line_number(line) {
            Some((number, text)) => self.edit_line(number, text),
            None => self.execute_immediate(line),
        }
    }

    /// Supply the value for a pending INPUT and resume the program
    pub fn provide_input(&mut self, raw: &str) {
        let target = match self.pending_input.take() {
            Some(target) if self.waiting_for_input => target,
            _ => {
                self.report_immediate_error(BasicError::CantContinue);
                return;
            }
        };
        self.waiting_for_input = false;

        // The host echoes what was typed; end the prompt line
        if self.output.is_line_open() {
            self.output.newline();
        }

        let value = raw.trim_end_matches(['\r', '\n']);
        debug!("input for {}: {:?}", target.name(), value);

        let stored = match &target {
            Target::ArrayElement { .. } => Err(BasicError::Unsupported("INPUT TO ARRAY".to_string())),
            Target::Variable(name) => {
                let value = if is_string_name(name) {
                    Value::Str(value.to_string())
                } else {
                    Value::Number(value.trim().parse().unwrap_or(0.0))
                };
                self.variables.set(name, value)
            }
        };

        match (stored, self.current_line) {
            (Err(err), Some(line)) if self.running => self.fail_run(line, err),
            (Err(err), _) => self.report_immediate_error(err),
            (Ok(()), _) if self.running => self.run_loop(),
            (Ok(()), _) => self.output.push_line(READY),
        }
    }

    /// Drain all output produced so far
    pub fn take_output(&mut self) -> Vec<String> {
        self.output.take_lines()
    }

    /// Parse and execute one statement without any error reporting
    pub fn execute(&mut self, text: &str) -> Result<()> {
        let statement = parse_statement(text)?;
        self.execute_statement(&statement)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    pub fn is_auto_mode(&self) -> bool {
        self.auto.active
    }

    /// Line number the next AUTO capture will be stored under
    pub fn auto_line(&self) -> Option<u32> {
        self.auto.active.then_some(self.auto.next_line)
    }

    /// Message of the most recent surfaced error
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn program_counter(&self) -> ProgramCounter {
        self.pc
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Read a scalar variable (0 or "" when unset)
    pub fn variable(&self, name: &str) -> Value {
        self.variables.get(&name.to_ascii_uppercase())
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }

    pub fn gosub_depth(&self) -> usize {
        self.gosub_stack.len()
    }

    /// Store or delete a numbered line
    fn edit_line(&mut self, number: &str, text: &str) {
        let line_number = match parse_line_number(number) {
            Ok(n) => n,
            Err(err) => {
                self.report_immediate_error(err);
                return;
            }
        };

        if text.is_empty() {
            debug!("delete line {}", line_number);
            self.program.delete_line(line_number);
        } else {
            debug!("store line {}: {}", line_number, text);
            self.program.store_line(line_number, text);
        }
    }

    /// Store a line captured in AUTO mode; a blank line leaves the mode
    fn capture_auto_line(&mut self, raw: &str) {
        let text = raw.trim();
        if text.is_empty() {
            debug!("leaving AUTO mode at line {}", self.auto.next_line);
            self.auto.active = false;
            self.output.push_line(READY);
            return;
        }

        let line_number = self.auto.next_line;
        debug!("auto store line {}: {}", line_number, text);
        self.program.store_line(line_number, text);

        match line_number.checked_add(self.auto.increment) {
            Some(next) => self.auto.next_line = next,
            None => {
                self.auto.active = false;
                self.report_immediate_error(BasicError::IllegalQuantity);
            }
        }
    }

    /// Execute a command typed without a line number
    fn execute_immediate(&mut self, text: &str) {
        self.current_line = None;
        self.transfer = None;

        if let Err(err) = self.execute(text) {
            self.transfer = None;
            self.report_immediate_error(err);
            return;
        }

        match self.transfer.take() {
            Some(Transfer::Goto(line)) => self.start_run(ProgramCounter::At(line)),
            Some(Transfer::ResumeAfter(line)) => self.start_run(ProgramCounter::After(line)),
            Some(Transfer::Halt) | None => {
                if !self.waiting_for_input && !self.auto.active {
                    self.output.push_line(READY);
                }
            }
        }
    }

    fn start_run(&mut self, pc: ProgramCounter) {
        debug!("run from {:?}", pc);
        self.pc = pc;
        self.running = true;
        self.run_loop();
    }

    /// Line the run loop executes next, if any
    fn next_line(&self) -> Option<u32> {
        match self.pc {
            ProgramCounter::Halted => None,
            ProgramCounter::At(line) => self.program.contains(line).then_some(line),
            ProgramCounter::After(line) => self.program.successor(line),
        }
    }

    /// Fetch and execute lines until the program halts, fails or waits for input
    fn run_loop(&mut self) {
        loop {
            let line_number = match self.next_line() {
                Some(line) => line,
                None => {
                    self.finish_run();
                    return;
                }
            };
            let text = match self.program.get_line(line_number) {
                Some(text) => text.to_string(),
                None => {
                    self.finish_run();
                    return;
                }
            };

            trace!("{} {}", line_number, text);
            self.current_line = Some(line_number);
            self.transfer = None;

            if let Err(err) = self.execute(&text) {
                self.fail_run(line_number, err);
                return;
            }

            if self.waiting_for_input {
                debug!("suspended for INPUT at line {}", line_number);
                self.pc = ProgramCounter::After(line_number);
                return;
            }

            self.pc = match self.transfer.take() {
                None => ProgramCounter::After(line_number),
                Some(Transfer::Goto(target)) => {
                    debug!("jump from {} to {}", line_number, target);
                    ProgramCounter::At(target)
                }
                Some(Transfer::ResumeAfter(site)) => ProgramCounter::After(site),
                Some(Transfer::Halt) => ProgramCounter::Halted,
            };
        }
    }

    /// Normal end of a run
    fn finish_run(&mut self) {
        debug!("program halted");
        self.halt();
        self.output.push_line("");
        self.output.push_line(READY);
    }

    /// Surface a run-time error with its line number and stop
    fn fail_run(&mut self, line_number: u32, err: BasicError) {
        warn!("error in line {}: {:?}", line_number, err);
        self.halt();
        self.error = Some(err.to_string());
        self.output.push_line(format!("?{} IN {}", err, line_number));
        self.output.push_line(READY);
    }

    /// Surface an error from an immediate command
    fn report_immediate_error(&mut self, err: BasicError) {
        warn!("immediate error: {:?}", err);
        self.error = Some(err.to_string());
        self.output.push_line(format!("?{}", err));
        self.output.push_line(READY);
    }

    fn halt(&mut self) {
        self.running = false;
        self.waiting_for_input = false;
        self.pending_input = None;
        self.pc = ProgramCounter::Halted;
        self.current_line = None;
    }

    /// Clear variables, arrays and both control stacks
    fn clear_state(&mut self) {
        self.variables.clear();
        self.loop_stack.clear();
        self.gosub_stack.clear();
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}
