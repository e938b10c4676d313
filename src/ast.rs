//! Syntax tree produced by the parser and walked by the interpreter.
//!
//! Every node owns its children: a [`SyntaxTree`] owns the whole structure and
//! dropping it releases everything below, nested subshell bodies included.

/// Operator joining two commands of a [`CommandList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    /// `&&`: run the next command only if the previous one succeeded.
    And,
    /// `||`: run the next command only if the previous one failed.
    Or,
}

impl ListOp {
    /// The operator's shell syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            ListOp::And => "&&",
            ListOp::Or => "||",
        }
    }

    /// Whether a command that finished with `status` ends the list here.
    pub fn short_circuits(self, status: i32) -> bool {
        match self {
            ListOp::And => status != 0,
            ListOp::Or => status == 0,
        }
    }
}

/// A program invocation: `argv[0]` followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Command name and arguments. Never empty; leading `!` words are not included.
    pub words: Vec<String>,
    /// Set when an odd number of `!` words preceded the command.
    pub negated: bool,
}

/// A parenthesized statement sequence run in a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubshellCommand {
    pub body: Statements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Simple(SimpleCommand),
    Subshell(SubshellCommand),
}

/// Commands joined by `&&` / `||`.
///
/// `ops[i]` joins `commands[i]` and `commands[i + 1]`, so a finished list has
/// exactly one op fewer than it has commands (or none of either).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    pub commands: Vec<Command>,
    pub ops: Vec<ListOp>,
}

impl CommandList {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Checks the commands/ops length relation of a finished list.
    pub fn is_well_formed(&self) -> bool {
        self.ops.len() == self.commands.len().saturating_sub(1)
    }
}

/// `;`-separated lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statements {
    pub lists: Vec<CommandList>,
}

impl Statements {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// A fully parsed input, ready to be handed to the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    pub root: Statements,
}

impl SyntaxTree {
    /// Walks every list in the tree, nested subshell bodies included.
    pub fn lists(&self) -> Vec<&CommandList> {
        let mut out = Vec::new();
        collect_lists(&self.root, &mut out);
        out
    }
}

fn collect_lists<'a>(statements: &'a Statements, out: &mut Vec<&'a CommandList>) {
    for list in &statements.lists {
        out.push(list);
        for command in &list.commands {
            if let Command::Subshell(sub) = command {
                collect_lists(&sub.body, out);
            }
        }
    }
}
