use bat::PrettyPrinter;
use colloquy::agents::Agent;
use console::style;

/// Print the roster of answering agents for this session.
pub fn agent_roster(agents: &[Agent]) {
    for agent in agents {
        println!(
            "  {} {}",
            style(&agent.name).cyan(),
            style(&agent.description).dim()
        );
    }
    println!();
}

/// Print one agent's answer, body rendered as markdown.
pub fn agent_answer(name: &str, content: &str) {
    println!("{}", style(name).cyan().bold());
    markdown(content);
    println!();
}

/// Print a failed agent's entry, keeping whatever partial text arrived.
pub fn agent_failure(name: &str, error: &str, partial: &str) {
    println!("{}", style(format!("{} (Error)", name)).red().bold());
    markdown(&format!("Error: {}\n\n{}", error, partial));
    println!();
}

/// Print a phase separator.
pub fn section(title: &str) {
    println!("\n{}\n", style(title).magenta().bold());
}

pub fn error_line(message: &str) {
    println!("{}", style(message).red());
}

fn markdown(content: &str) {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .unwrap();
}
