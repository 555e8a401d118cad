use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use frameseeker_core::error::PersistError;
use frameseeker_core::persist::DirectoryPicker;

/// Asks for a save directory on the terminal. An empty answer cancels.
pub struct StdinPicker;

impl DirectoryPicker for StdinPicker {
    fn pick(&mut self) -> Result<Option<PathBuf>, PersistError> {
        eprint!("Save frames to directory (empty to cancel): ");
        io::stderr().flush().map_err(PersistError::Picker)?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(PersistError::Picker)?;

        let answer = line.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(answer)))
        }
    }
}
