pub(crate) mod tm_parser;

use super::program_code::ProgramCode;
use simple_error::SimpleError;
use std::error::Error;
use std::fs::File;
use std::io::Read;

/// Program parser is a trait implemented by parsers of TM program file
/// formats. Implementors of the trait have to implement the parse_str
/// function.
pub trait ProgramCodeParser {
    /// Parse string
    fn parse_str(&self, data: &str) -> Result<ProgramCode, SimpleError>;

    fn parse(&self, mut file: File) -> Result<ProgramCode, Box<dyn Error>> {
        let mut file_data = String::new();
        file.read_to_string(&mut file_data)?;
        Ok(self.parse_str(file_data.as_str())?)
    }
}
