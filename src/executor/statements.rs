//! Statement handlers

use super::{AutoState, Executor, LoopState, Transfer};
use crate::error::{BasicError, Result};
use crate::help;
use crate::output::{format_number, CLEAR_SCREEN};
use crate::parser::{parse_data_values, DataValue, Expression, PrintItem, Statement, Target};
use crate::tokenizer::split_keyword;
use crate::variables::Value;
use log::{debug, info};

impl Executor {
    /// Execute a statement
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<()> {
        if self.current_line.is_some() && statement.is_immediate_only() {
            return Err(BasicError::Unsupported(format!(
                "{} IN PROGRAM",
                immediate_command_name(statement)
            )));
        }

        match statement {
            Statement::Print { items } => self.execute_print(items),
            Statement::Let { target, expression } => {
                let value = self.evaluate(expression)?;
                self.assign(target, value)
            }
            Statement::Input { prompt, target } => self.execute_input(prompt.as_deref(), target),
            Statement::Goto { line_number } => self.execute_goto(*line_number),
            Statement::Gosub { line_number } => self.execute_gosub(*line_number),
            Statement::If {
                condition,
                then_part,
            } => {
                if self.eval_number(condition)? != 0.0 {
                    self.execute_statement(then_part)
                } else {
                    Ok(())
                }
            }
            Statement::For {
                variable,
                start,
                end,
                step,
            } => self.execute_for(variable, start, end, step.as_ref()),
            Statement::Next { variables } => self.execute_next(variables),
            Statement::Return => self.execute_return(),
            Statement::End => {
                self.transfer = Some(Transfer::Halt);
                Ok(())
            }
            Statement::Cls => {
                self.output.push_line(CLEAR_SCREEN);
                Ok(())
            }
            // DATA is collected before the run starts
            Statement::Rem { .. } | Statement::Data { .. } => Ok(()),
            Statement::Dim { arrays } => self.execute_dim(arrays),
            Statement::Read { targets } => self.execute_read(targets),
            Statement::Restore => {
                self.data_cursor = 0;
                Ok(())
            }
            Statement::Poke { address, value } => {
                let address = self.eval_number(address)?;
                let value = self.eval_number(value)?;
                self.memory.poke(address.trunc() as i64, value.trunc() as i64)
            }
            Statement::On {
                selector,
                gosub,
                targets,
            } => self.execute_on(selector, *gosub, targets),
            Statement::Save { name } => self.execute_save(name),
            Statement::Load { name } => self.execute_load(name),
            Statement::Files => {
                for name in self.storage.list()? {
                    self.output.push_line(name);
                }
                Ok(())
            }
            Statement::Kill { name } => {
                self.storage.delete(name)?;
                info!("deleted program {}", name);
                Ok(())
            }
            Statement::Auto { start, increment } => {
                self.auto = AutoState {
                    active: true,
                    next_line: start.unwrap_or(self.config.auto_start),
                    increment: increment.unwrap_or(self.config.auto_increment),
                };
                debug!("AUTO from {} step {}", self.auto.next_line, self.auto.increment);
                Ok(())
            }
            Statement::Help { topic } => {
                self.execute_help(topic.as_deref());
                Ok(())
            }
            Statement::Run { line_number } => self.execute_run(*line_number),
            Statement::List { from, to } => {
                let listing: Vec<String> = self
                    .program
                    .list(*from, *to)
                    .into_iter()
                    .map(|(number, text)| format!("{} {}", number, text))
                    .collect();
                for line in listing {
                    self.output.push_line(line);
                }
                Ok(())
            }
            Statement::New => {
                debug!("NEW");
                self.program.clear_program();
                self.clear_state();
                self.data_pool.clear();
                self.data_cursor = 0;
                self.halt();
                Ok(())
            }
        }
    }

    /// Store a value in a variable or array element
    fn assign(&mut self, target: &Target, value: Value) -> Result<()> {
        match target {
            Target::Variable(name) => self.variables.set(name, value),
            Target::ArrayElement { name, indices } => {
                let indices = self.eval_indices(indices)?;
                self.variables.set_array_element(name, &indices, value)
            }
        }
    }

    /// Execute a PRINT statement
    fn execute_print(&mut self, items: &[PrintItem]) -> Result<()> {
        for item in items {
            match item {
                PrintItem::Expression(expr) => {
                    let text = match self.evaluate(expr)? {
                        Value::Number(n) => format_number(n),
                        Value::Str(s) => s,
                    };
                    self.output.write(&text);
                }
                PrintItem::Semicolon => {}
                PrintItem::Comma => self.output.next_zone(),
            }
        }

        // A trailing separator keeps the line open
        if !matches!(items.last(), Some(PrintItem::Semicolon) | Some(PrintItem::Comma)) {
            self.output.newline();
        }
        Ok(())
    }

    /// Execute INPUT: show the prompt and suspend
    fn execute_input(&mut self, prompt: Option<&str>, target: &Target) -> Result<()> {
        if let Some(prompt) = prompt {
            self.output.write(prompt);
        }
        self.output.write("? ");
        self.waiting_for_input = true;
        self.pending_input = Some(target.clone());
        Ok(())
    }

    fn ensure_line(&self, line_number: u32) -> Result<()> {
        if self.program.contains(line_number) {
            Ok(())
        } else {
            Err(BasicError::UndefinedLine(line_number))
        }
    }

    /// Execute GOTO statement
    fn execute_goto(&mut self, line_number: u32) -> Result<()> {
        self.ensure_line(line_number)?;
        self.transfer = Some(Transfer::Goto(line_number));
        Ok(())
    }

    /// Execute GOSUB statement
    fn execute_gosub(&mut self, line_number: u32) -> Result<()> {
        let call_site = self
            .current_line
            .ok_or_else(|| BasicError::Unsupported("DIRECT GOSUB".to_string()))?;
        self.ensure_line(line_number)?;
        self.gosub_stack.push(call_site);
        self.transfer = Some(Transfer::Goto(line_number));
        Ok(())
    }

    /// Execute RETURN statement
    fn execute_return(&mut self) -> Result<()> {
        if self.current_line.is_none() {
            return Err(BasicError::Unsupported("DIRECT RETURN".to_string()));
        }
        let call_site = self.gosub_stack.pop().ok_or(BasicError::ReturnWithoutGosub)?;
        self.transfer = Some(Transfer::ResumeAfter(call_site));
        Ok(())
    }

    /// Execute FOR statement
    fn execute_for(
        &mut self,
        variable: &str,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
    ) -> Result<()> {
        let anchor = self
            .current_line
            .ok_or_else(|| BasicError::Unsupported("DIRECT FOR".to_string()))?;

        let start = self.eval_number(start)?;
        let end = self.eval_number(end)?;
        let step = match step {
            Some(expr) => self.eval_number(expr)?,
            None => 1.0,
        };

        self.variables.set(variable, Value::Number(start))?;

        // Re-entering a FOR drops that loop and everything nested inside it
        if let Some(index) = self.loop_stack.iter().rposition(|l| l.variable == variable) {
            self.loop_stack.truncate(index);
        }
        self.loop_stack.push(LoopState {
            variable: variable.to_string(),
            end,
            step,
            anchor,
        });
        Ok(())
    }

    /// Execute NEXT statement; each named variable is tried in turn until one loops
    fn execute_next(&mut self, variables: &[String]) -> Result<()> {
        if self.current_line.is_none() {
            return Err(BasicError::Unsupported("DIRECT NEXT".to_string()));
        }
        if variables.is_empty() {
            self.next_iteration(None)?;
            return Ok(());
        }

        for variable in variables {
            if self.next_iteration(Some(variable))? {
                break;
            }
        }
        Ok(())
    }

    /// Advance one loop. Returns true when the loop continues.
    fn next_iteration(&mut self, variable: Option<&str>) -> Result<bool> {
        let index = match variable {
            None => self
                .loop_stack
                .len()
                .checked_sub(1)
                .ok_or(BasicError::NextWithoutFor)?,
            Some(name) => self
                .loop_stack
                .iter()
                .rposition(|l| l.variable == name)
                .ok_or_else(|| BasicError::NextWithoutForVariable(name.to_string()))?,
        };
        self.loop_stack.truncate(index + 1);

        let LoopState {
            variable,
            end,
            step,
            anchor,
        } = self.loop_stack[index].clone();

        let next = self.variables.get(&variable).as_number()? + step;
        let continues = if step > 0.0 {
            next <= end
        } else if step < 0.0 {
            next >= end
        } else {
            false
        };

        if continues {
            self.variables.set(&variable, Value::Number(next))?;
            self.transfer = Some(Transfer::ResumeAfter(anchor));
        } else {
            self.loop_stack.pop();
        }
        Ok(continues)
    }

    /// Execute DIM statement
    fn execute_dim(&mut self, arrays: &[(String, Vec<Expression>)]) -> Result<()> {
        for (name, dimensions) in arrays {
            let mut bounds = Vec::with_capacity(dimensions.len());
            for dimension in dimensions {
                let size = self.eval_number(dimension)?.trunc();
                if !(0.0..=u32::MAX as f64).contains(&size) {
                    return Err(BasicError::IllegalQuantity);
                }
                bounds.push(size as usize);
            }
            self.variables.dim_array(name, bounds)?;
        }
        Ok(())
    }

    /// Execute READ statement
    fn execute_read(&mut self, targets: &[Target]) -> Result<()> {
        for target in targets {
            let item = self
                .data_pool
                .get(self.data_cursor)
                .cloned()
                .ok_or(BasicError::OutOfData)?;
            self.data_cursor += 1;

            let value = match (target.is_string(), item) {
                (true, DataValue::String(s)) => Value::Str(s),
                (true, DataValue::Number(n)) => Value::Str(format_number(n)),
                (false, DataValue::Number(n)) => Value::Number(n),
                (false, DataValue::String(_)) => return Err(BasicError::TypeMismatch),
            };
            self.assign(target, value)?;
        }
        Ok(())
    }

    /// Collect every DATA item in line order
    fn prescan_data(&mut self) -> Result<()> {
        let mut pool = Vec::new();
        for (line_number, text) in self.program.lines() {
            let (keyword, rest) = split_keyword(text);
            if keyword == "DATA" {
                let values = parse_data_values(rest).map_err(|err| {
                    debug!("bad DATA in line {}", line_number);
                    err
                })?;
                pool.extend(values);
            }
        }
        self.data_pool = pool;
        self.data_cursor = 0;
        Ok(())
    }

    /// Execute ON ... GOTO/GOSUB
    fn execute_on(&mut self, selector: &Expression, gosub: bool, targets: &[u32]) -> Result<()> {
        let index = self.eval_number(selector)?.round();
        if index < 1.0 || index > targets.len() as f64 {
            return Ok(());
        }

        let line_number = targets[index as usize - 1];
        if gosub {
            self.execute_gosub(line_number)
        } else {
            self.execute_goto(line_number)
        }
    }

    /// Execute SAVE statement
    fn execute_save(&mut self, name: &str) -> Result<()> {
        let snapshot = self.program.snapshot();
        self.storage.save(name, &snapshot)?;
        info!("saved {} lines as {}", snapshot.lines.len(), name);
        Ok(())
    }

    /// Execute LOAD: the current program survives unless the snapshot is valid
    fn execute_load(&mut self, name: &str) -> Result<()> {
        let snapshot = self.storage.load(name)?;
        snapshot.validate()?;

        info!("loaded {} lines from {}", snapshot.lines.len(), name);
        self.program.replace(snapshot);
        self.clear_state();
        self.data_pool.clear();
        self.data_cursor = 0;
        if self.running {
            self.transfer = Some(Transfer::Halt);
        }
        Ok(())
    }

    fn execute_help(&mut self, topic: Option<&str>) {
        match topic {
            None => {
                for name in help::topic_names() {
                    self.output.push_line(name);
                }
            }
            Some(topic) => match help::lookup(topic) {
                Some(text) => {
                    for line in text.lines() {
                        self.output.push_line(line);
                    }
                }
                None => self.output.push_line(format!("NO HELP FOUND FOR {}", topic)),
            },
        }
    }

    /// Execute RUN: cold start from the first line or a given line
    fn execute_run(&mut self, line_number: Option<u32>) -> Result<()> {
        if let Some(line) = line_number {
            self.ensure_line(line)?;
        }

        self.clear_state();
        self.prescan_data()?;
        debug!("RUN with {} DATA items", self.data_pool.len());

        self.transfer = Some(match line_number {
            Some(line) => Transfer::Goto(line),
            // After line 0 is the first program line
            None => Transfer::ResumeAfter(0),
        });
        Ok(())
    }
}

fn immediate_command_name(statement: &Statement) -> &'static str {
    match statement {
        Statement::Run { .. } => "RUN",
        Statement::List { .. } => "LIST",
        _ => "NEW",
    }
}
