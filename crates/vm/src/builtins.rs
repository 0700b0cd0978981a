//! Host-implemented intrinsics.
//!
//! Calls whose name begins and ends with double underscores never reach the
//! user function table; they dispatch here. An unrecognized name is a runtime
//! error rather than a silent misexecution.

use crate::error::VmError;
use crate::vm::Vm;
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use zinc_core::Value;

/// An open file tracked by the VM. The language addresses files through
/// integer handles; the handle table lives on the VM itself.
pub(crate) enum FileHandle {
    /// Opened for reading: remaining lines, front first.
    Read { lines: VecDeque<String> },
    /// Opened for writing: the file was created (and truncated) on open.
    Write,
}

impl<'a> Vm<'a> {
    pub(crate) fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, VmError> {
        match name {
            "__strstr__" => {
                if args.len() < 2 {
                    return Ok(Value::Bool(false));
                }
                let haystack = args[0].to_string();
                let needle = args[1].to_string();
                Ok(Value::Bool(haystack.contains(&needle)))
            }

            "__open_file__" => self.open_file(&args),
            "__close_file__" => {
                if let Some(Value::Int(handle)) = args.first() {
                    self.files.remove(handle);
                }
                Ok(Value::Null)
            }
            "__has_line__" => {
                let handle = match args.first() {
                    Some(Value::Int(handle)) => *handle,
                    _ => return Ok(Value::Bool(false)),
                };
                match self.files.get(&handle) {
                    Some(FileHandle::Read { lines }) => Ok(Value::Bool(!lines.is_empty())),
                    Some(FileHandle::Write) => Ok(Value::Bool(false)),
                    None => Err(VmError::fault("Not an open file")),
                }
            }
            "__read_line__" => {
                let handle = match args.first() {
                    Some(Value::Int(handle)) => *handle,
                    _ => return Ok(Value::Null),
                };
                match self.files.get_mut(&handle) {
                    Some(FileHandle::Read { lines }) => {
                        Ok(lines.pop_front().map(Value::Str).unwrap_or(Value::Null))
                    }
                    Some(FileHandle::Write) => Ok(Value::Null),
                    None => Err(VmError::fault("Not an open file")),
                }
            }

            // GUI operations run headless: window management is logged,
            // drawing is a no-op, and the main loop is told to exit at once.
            "__open_window__" => {
                let width = args.first().map(|v| v.to_string()).unwrap_or_else(|| "800".into());
                let height = args.get(1).map(|v| v.to_string()).unwrap_or_else(|| "600".into());
                let title = args.get(2).map(|v| v.to_string()).unwrap_or_else(|| "Zinc App".into());
                writeln!(self.output, "[GUI] Opening window: {}x{} - {}", width, height, title)?;
                Ok(Value::Null)
            }
            "__close_window__" => {
                writeln!(self.output, "[GUI] Closing window")?;
                Ok(Value::Null)
            }
            "__begin_drawing__" | "__end_drawing__" | "__clear_screen__"
            | "__draw_rectangle__" | "__draw_text__" => Ok(Value::Null),
            "__window_should_close__" => Ok(Value::Bool(true)),
            "__mouse_x__" | "__mouse_y__" => Ok(Value::Int(0)),
            "__mouse_pressed__" => Ok(Value::Bool(false)),

            _ => Err(VmError::fault(format!("Unknown built-in function: {}", name))),
        }
    }

    /// `__open_file__(path, mode)`: returns an integer handle, or null when
    /// the file cannot be opened. Either way the `__last_file__` global is
    /// updated so `failed to open` can test the outcome.
    fn open_file(&mut self, args: &[Value]) -> Result<Value, VmError> {
        let path = match args.first() {
            Some(value) => value.to_string(),
            None => return Err(VmError::fault("__open_file__ expects a path")),
        };
        let mode = args.get(1).map(|v| v.to_string()).unwrap_or_else(|| "read".into());

        let handle = if mode == "write" {
            match fs::File::create(&path) {
                Ok(_) => Some(FileHandle::Write),
                Err(_) => None,
            }
        } else {
            match fs::read_to_string(&path) {
                Ok(content) => Some(FileHandle::Read {
                    lines: content.lines().map(str::to_string).collect(),
                }),
                Err(_) => None,
            }
        };

        let result = match handle {
            Some(handle) => {
                let id = self.next_file_id;
                self.next_file_id += 1;
                self.files.insert(id, handle);
                Value::Int(id)
            }
            None => Value::Null,
        };
        self.globals.insert("__last_file__".to_string(), result.clone());
        Ok(result)
    }
}
