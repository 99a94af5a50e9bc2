//! PlantUML-style state diagrams.

use crate::core::{Event, Key, State};
use crate::engine::{Entry, StateMachine};
use crate::export::{reachable, ExportError, Owners};
use crate::registry::Registry;
use indexmap::{IndexMap, IndexSet};

/// Render `root` and every machine it links into as one diagram.
pub fn render(registry: &Registry, root: &str) -> Result<String, ExportError> {
    let machines = reachable(registry, root)?;
    let owners = Owners::new(registry);
    let mut aliases = Aliases::default();
    let mut blocks = Vec::new();
    let mut edges = Vec::new();
    for machine in &machines {
        let (block, machine_edges) = draw(machine, owners, &mut aliases);
        blocks.push(block);
        edges.extend(machine_edges);
    }
    Ok(wrap(&blocks, &edges))
}

/// Render a single machine without following its links.
pub fn render_machine(machine: &StateMachine) -> String {
    let (block, edges) = draw(machine, Owners::local(), &mut Aliases::default());
    wrap(&[block], &edges)
}

fn wrap(blocks: &[String], edges: &[String]) -> String {
    let mut out = String::from("@startuml\n");
    for block in blocks {
        out.push_str(block);
    }
    for edge in edges {
        out.push_str(edge);
        out.push('\n');
    }
    out.push_str("@enduml\n");
    out
}

/// What a diagram alias stands for.
#[derive(Clone, PartialEq, Eq, Hash)]
enum Node {
    Machine(String),
    State(String, Key),
    Choice(String, Key, Event),
}

/// Diagram-wide alias table; distinct nodes never share an alias.
#[derive(Default)]
struct Aliases {
    assigned: IndexMap<Node, String>,
    taken: IndexSet<String>,
}

impl Aliases {
    fn of(&mut self, node: Node) -> String {
        if let Some(alias) = self.assigned.get(&node) {
            return alias.clone();
        }
        let base = sanitize(&match &node {
            Node::Machine(machine) => machine.clone(),
            Node::State(machine, key) => format!("{machine}_{key}"),
            Node::Choice(machine, key, event) => format!("{machine}_{key}_{event}_choice"),
        });
        let mut alias = base.clone();
        let mut n = 1;
        while self.taken.contains(&alias) {
            n += 1;
            alias = format!("{base}_{n}");
        }
        self.taken.insert(alias.clone());
        self.assigned.insert(node, alias.clone());
        alias
    }
}

struct Canvas<'a> {
    machine: &'a StateMachine,
    owners: Owners<'a>,
    aliases: &'a mut Aliases,
    states: IndexMap<String, String>,
    edges: Vec<String>,
}

impl Canvas<'_> {
    /// Alias of `state`, declaring it in this block if the machine owns it.
    fn declare(&mut self, state: &State) -> String {
        if state.is_terminal() {
            return state.id().to_string();
        }
        let owner = self.owners.resolve(self.machine, state);
        let local = owner == self.machine.name();
        let alias = self.aliases.of(Node::State(owner, state.id().clone()));
        if local {
            self.push_state(&alias, state);
        }
        alias
    }

    fn push_state(&mut self, alias: &str, state: &State) {
        if self.states.contains_key(alias) {
            return;
        }
        let line = match state.stereotype() {
            Some(stereotype) => format!("    state \"{}\" as {} <<{}>>", state.id(), alias, stereotype),
            None => format!("    state \"{}\" as {}", state.id(), alias),
        };
        self.states.insert(alias.to_string(), line);
    }

    fn link(&mut self, from: &str, label: String, entry: &Entry) {
        let to = self.declare(entry.state());
        self.edges.push(edge(from, &to, &label));
        if let Some(fork) = entry.fork() {
            for branch in fork.entries() {
                self.link(&to, branch.desc().to_string(), branch);
            }
        }
    }
}

fn draw<'a>(
    machine: &'a StateMachine,
    owners: Owners<'a>,
    aliases: &'a mut Aliases,
) -> (String, Vec<String>) {
    let mut canvas = Canvas {
        machine,
        owners,
        aliases,
        states: IndexMap::new(),
        edges: Vec::new(),
    };
    for state in machine.states() {
        canvas.declare(state);
    }

    for (state, event, linkers) in machine.transitions() {
        let from = canvas
            .aliases
            .of(Node::State(machine.name().to_string(), state.clone()));
        if let [linker] = linkers {
            let exit = linker.exit();
            let label = format!("{}<{}>{}", event, exit.desc(), suffix(linker.entry().desc()));
            canvas.link(&from, label, linker.entry());
            continue;
        }

        let choice = State::new(format!("{state}_{event}_choice")).with_stereotype("choice");
        let choice_alias = canvas.aliases.of(Node::Choice(
            machine.name().to_string(),
            state.clone(),
            event.clone(),
        ));
        canvas.push_state(&choice_alias, &choice);
        canvas.edges.push(edge(&from, &choice_alias, &event.to_string()));
        for linker in linkers {
            let label = format!("[{}]{}", linker.exit().desc(), suffix(linker.entry().desc()));
            canvas.link(&choice_alias, label, linker.entry());
        }
    }

    let block_alias = canvas.aliases.of(Node::Machine(machine.name().to_string()));
    let mut block = format!(
        "state \"<<DFA>> [{}] state graph\" as {} {{\n",
        machine.name(),
        block_alias
    );
    for line in canvas.states.values() {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str("}\n");
    (block, canvas.edges)
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn edge(from: &str, to: &str, label: &str) -> String {
    if label.is_empty() {
        format!("{from} --> {to}")
    } else {
        format!("{from} --> {to} : {label}")
    }
}

fn suffix(action: &str) -> String {
    if action.is_empty() {
        String::new()
    } else {
        format!(" / {action}")
    }
}
