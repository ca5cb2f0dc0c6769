use crate::cli::ModuleName;
use crate::error::Result;
use trajan::analysis::module::AnalysisModule;
use trajan::analysis::options::{OptionDef, OptionKind, OptionValue};
use trajan::modules::{gyrate::RadiusOfGyration, rmsd::ReferenceRmsd};
use trajan::workflows::analyze::AnalysisSession;

pub fn run(module: ModuleName) -> Result<()> {
    let lines = match module {
        ModuleName::Gyrate => describe(RadiusOfGyration::new())?,
        ModuleName::Rmsd => describe(ReferenceRmsd::new())?,
    };
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Help text of the module followed by every option it accepts.
pub fn describe<M: AnalysisModule>(module: M) -> Result<Vec<String>> {
    let session = AnalysisSession::new(module)?;
    let mut lines = vec![format!("{}:", session.module().name()), String::new()];
    lines.extend(session.help().lines().iter().map(|line| strip_markup(line)));
    lines.push(String::new());
    lines.push("Options:".to_string());
    lines.extend(session.options().definitions().iter().map(option_line));
    Ok(lines)
}

fn strip_markup(line: &str) -> String {
    line.replace("[TT]", "").replace("[tt]", "")
}

fn option_line(def: &OptionDef) -> String {
    let flag = match def.short {
        Some(short) => format!("-{}, --{}", short, def.name),
        None => format!("    --{}", def.name),
    };
    let kind = match def.kind {
        OptionKind::Choice(choices) => format!("<{}>", choices.join("|")),
        OptionKind::Bool => String::new(),
        OptionKind::Real => "<VALUE>".to_string(),
        OptionKind::Path => "<PATH>".to_string(),
        OptionKind::Text => "<TEXT>".to_string(),
    };
    let default = match &def.default {
        Some(OptionValue::Bool(value)) => format!(" [default: {}]", value),
        Some(OptionValue::Text(value)) => format!(" [default: {}]", value),
        Some(OptionValue::Real(value)) => format!(" [default: {}]", value),
        Some(OptionValue::Path(value)) => format!(" [default: {}]", value.display()),
        None => String::new(),
    };
    format!("  {:<20} {:<26} {}{}", flag, kind, def.description, default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gyrate_description_lists_module_and_runner_options() {
        let lines = describe(RadiusOfGyration::new()).unwrap();
        assert_eq!(lines[0], "gyrate:");
        assert!(lines.iter().any(|l| l.contains("--no-mass-weighted")));
        assert!(!lines.iter().any(|l| l.contains("[TT]")));
        assert!(lines.iter().any(|l| l.contains("--mass-weighted")));
        assert!(lines.iter().any(|l| l.starts_with("  -s, --topology")));
        assert!(lines.iter().any(|l| l.contains("--pbc")));
    }

    #[test]
    fn rmsd_description_hides_the_fixed_pbc_option() {
        let lines = describe(ReferenceRmsd::new()).unwrap();
        let options = lines.iter().skip_while(|l| *l != "Options:");
        assert!(!options.clone().any(|l| l.contains("--pbc ")));
        assert!(options.clone().any(|l| l.contains("--rmpbc")));
    }
}
