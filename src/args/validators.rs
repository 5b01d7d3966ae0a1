use super::types::Args;

/// Parse a strictly positive count.
///
/// # Errors
/// Returns a message when `raw` is not an integer greater than zero.
pub fn check_positive_count(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("The count must be at least 1.".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("The count '{raw}' is not a valid number: {e}")),
    }
}

/// Checks invariants across fields of a parsed `Args`.
///
/// # Errors
/// Returns a message describing the problem.
pub fn validate(args: &Args) -> Result<(), String> {
    if args.timestamps.is_empty() {
        return Err("At least one timestamp is required.".to_string());
    }
    if args.once && args.max_emissions.is_some() {
        return Err("--once cannot be combined with --max-emissions.".to_string());
    }
    if args.max_emissions == Some(0) {
        return Err("--max-emissions must be at least 1.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(timestamps: &[&str]) -> Args {
        Args {
            timestamps: timestamps.iter().map(ToString::to_string).collect(),
            ..Args::default()
        }
    }

    #[test]
    fn positive_counts() {
        assert_eq!(check_positive_count("3"), Ok(3));
        assert!(check_positive_count("0").is_err());
        assert!(check_positive_count("-1").is_err());
        assert!(check_positive_count("many").is_err());
    }

    #[test]
    fn requires_a_timestamp() {
        assert!(validate(&Args::default()).is_err());
        assert!(validate(&args_with(&["2024-05-01"])).is_ok());
    }

    #[test]
    fn once_conflicts_with_max_emissions() {
        let mut args = args_with(&["1714557600000"]);
        args.once = true;
        args.max_emissions = Some(2);
        assert!(validate(&args).is_err());
    }
}
