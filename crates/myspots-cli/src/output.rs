//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use myspots_core::{PlaceCandidate, SkippedRecord};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print numbered search candidates for selection
    pub fn print_candidates(&self, candidates: &[PlaceCandidate]) {
        match self.format {
            OutputFormat::Human => {
                for (i, candidate) in candidates.iter().enumerate() {
                    println!("---");
                    println!("#{}", i + 1);
                    println!("Name:    {}", candidate.name);
                    println!("Address: {}", truncate(&candidate.formatted_address, 70));
                    println!();
                }
            }
            OutputFormat::Json => {
                let json_candidates: Vec<_> = candidates
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "place_id": c.google_place_id,
                            "name": c.name,
                            "address": c.formatted_address,
                            "latitude": c.latitude,
                            "longitude": c.longitude
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json_candidates).unwrap());
            }
            OutputFormat::Quiet => {
                for candidate in candidates {
                    println!("{}", candidate.google_place_id);
                }
            }
        }
    }

    /// Print the end-of-run listing of records skipped during parsing
    pub fn print_skipped(&self, skipped: &[SkippedRecord]) {
        if skipped.is_empty() {
            return;
        }
        match self.format {
            OutputFormat::Human => {
                eprintln!();
                eprintln!("Skipped {} malformed record(s):", skipped.len());
                for record in skipped {
                    eprintln!("  {}", record);
                }
            }
            OutputFormat::Json => {
                let json_skipped: Vec<_> = skipped
                    .iter()
                    .map(|s| serde_json::json!({"id": s.id, "reason": s.reason}))
                    .collect();
                eprintln!("{}", serde_json::to_string_pretty(&json_skipped).unwrap());
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for interactive input
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

/// Truncate a string to max length in chars, adding "..." if truncated
///
/// Counts chars rather than bytes so non-ASCII text never splits inside
/// a character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte_address() {
        // German/French street names are routine provider output
        let address = "é".repeat(40);
        assert_eq!(truncate(&address, 70), address);
        assert_eq!(truncate(&address, 10), format!("{}...", "é".repeat(7)));
        assert_eq!(truncate("Marktstraße 12, 80331 München", 12), "Marktstra...");
    }
}
