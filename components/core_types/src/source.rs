//! Call stack frame information attached to runtime errors.

/// A single frame of the script call stack at the time of a fault.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("update".to_string()),
///     offset: 12,
///     line: Some(40),
/// };
///
/// assert_eq!(frame.to_string(), "update @12 (line 40)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for the top-level chunk
    pub function_name: Option<String>,
    /// Instruction offset within the function
    pub offset: usize,
    /// Source line, if the chunk carries line information
    pub line: Option<u32>,
}

impl std::fmt::Display for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<script>");
        write!(f, "{} @{}", name, self.offset)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}
