//! Output formatting module
//!
//! This module handles formatting models, reports and simulation traces for
//! different output formats.

use crate::Result;
use crate::state_machine::{
    CycleAnalysis, FsmModel, GuardOutcome, SimulationStep, TransitionGraph, VerificationReport,
    simulator::enabled_events,
};
use serde::Serialize;

/// Output any serializable value as pretty JSON
pub fn output_json(w: &mut impl std::io::Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// Output a model as text table
pub fn output_model_table(w: &mut impl std::io::Write, model: &FsmModel) -> Result<()> {
    let stats = TransitionGraph::from_model(model).stats();

    writeln!(w, "State Machine: {}", model.title())?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  Id:              {}", model.id())?;
    writeln!(w, "  Initial State:   {}", model.initial_state())?;
    writeln!(w, "  States:          {}", model.metadata().node_count)?;
    writeln!(w, "  Transitions:     {}", model.metadata().edge_count)?;
    writeln!(w, "  Terminal States: {}", stats.terminal_states)?;
    writeln!(w)?;

    if !model.transitions().is_empty() {
        writeln!(w, "Transitions:")?;
        writeln!(w, "{:-<100}", "")?;
        writeln!(
            w,
            "{:<18} {:<16} {:<14} {:<18} {:<18} {:<12}",
            "State", "Event", "Guard", "Action", "Next State", "Source"
        )?;
        writeln!(w, "{:-<100}", "")?;

        for t in model.transitions() {
            writeln!(
                w,
                "{:<18} {:<16} {:<14} {:<18} {:<18} {:<12}",
                shorten(t.state.as_str(), 18),
                shorten(t.event.as_str(), 16),
                shorten(t.guard.as_deref().unwrap_or("-"), 14),
                shorten(&t.action, 18),
                shorten(t.next_state.as_str(), 18),
                t.source.name()
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}

/// Output a verification report as text
pub fn output_report_table(
    w: &mut impl std::io::Write,
    model: &FsmModel,
    report: &VerificationReport,
) -> Result<()> {
    let mark = |ok: bool| if ok { "yes" } else { "NO" };

    writeln!(w, "Verification Report: {}", model.title())?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;
    writeln!(w, "  Deterministic:      {}", mark(report.is_deterministic))?;
    writeln!(w, "  Complete:           {}", mark(report.is_complete))?;
    writeln!(w, "  Unreachable States: {}", report.unreachable_states.len())?;
    match report.cycles {
        CycleAnalysis::Exact { count } => writeln!(w, "  Cycles:             {}", count)?,
        CycleAnalysis::Truncated { found, .. } => {
            writeln!(w, "  Cycles:             >= {} (search truncated)", found)?
        }
    }
    writeln!(w)?;

    if !report.errors.is_empty() {
        writeln!(w, "Errors:")?;
        for error in &report.errors {
            writeln!(w, "   {}", error)?;
        }
        writeln!(w)?;
    }

    if !report.warnings.is_empty() {
        writeln!(w, "Warnings:")?;
        for warning in &report.warnings {
            writeln!(w, "   {}", warning)?;
        }
        writeln!(w)?;
    }

    if !report.missing_transitions.is_empty() {
        writeln!(w, "Missing Transitions:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<24} {:<16} {:<38}", "State", "Event", "Reason")?;
        writeln!(w, "{:-<80}", "")?;
        for missing in &report.missing_transitions {
            writeln!(
                w,
                "{:<24} {:<16} {:<38}",
                shorten(missing.state.as_str(), 24),
                shorten(missing.event.as_str(), 16),
                missing.reason
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}

/// Output a simulation trace as text table
pub fn output_steps_table(
    w: &mut impl std::io::Write,
    model: &FsmModel,
    steps: &[SimulationStep],
) -> Result<()> {
    writeln!(w, "Simulation: {}", model.title())?;
    writeln!(w, "{:-<96}", "")?;
    writeln!(
        w,
        "{:>4} {:<20} {:<16} {:<20} {:<20} {:<8}",
        "#", "State", "Event", "Next State", "Action", "Guard"
    )?;
    writeln!(w, "{:-<96}", "")?;

    for (idx, step) in steps.iter().enumerate() {
        let guard = match step.guard_evaluated {
            GuardOutcome::Passed => "true",
            GuardOutcome::Failed => "false",
            GuardOutcome::NotApplicable => "-",
        };
        writeln!(
            w,
            "{:>4} {:<20} {:<16} {:<20} {:<20} {:<8}",
            idx + 1,
            shorten(step.current_state.as_str(), 20),
            shorten(step.event.as_str(), 16),
            shorten(step.next_state.as_str(), 20),
            shorten(&step.action, 20),
            guard
        )?;
    }
    writeln!(w)?;

    if let Some(last) = steps.last() {
        let enabled: Vec<&str> = enabled_events(model, &last.next_state)
            .into_iter()
            .map(|e| e.as_str())
            .collect();
        writeln!(w, "Final State: {}", last.next_state)?;
        if enabled.is_empty() {
            writeln!(w, "Enabled Events: none")?;
        } else {
            writeln!(w, "Enabled Events: {}", enabled.join(", "))?;
        }
    }

    Ok(())
}
