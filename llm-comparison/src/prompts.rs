//! Named prompt templates
//!
//! The library starts with the built-in prompting techniques and can be
//! extended from a TOML file:
//!
//! ```toml
//! [prompts]
//! terse = "Answer in one sentence."
//! ```
//!
//! `persona` is parameterized; select it as `persona` for the default role or
//! `persona:<role>` for a specific one.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PERSONA: &str = "persona";
const DEFAULT_PERSONA_ROLE: &str = "subject-matter expert";

/// Prompt library errors
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Unknown prompt template: {0}")]
    Unknown(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid prompt file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

const ZERO_SHOT: &str = "You are a helpful, knowledgeable assistant. Give a clear, accurate and \
concise answer to the user's input. Think the problem through before you answer, and use bullet \
points or numbered lists when structure helps. Keep a friendly, neutral tone. Answer the \
following prompt:";

const ONE_SHOT: &str = "You are a helpful, knowledgeable assistant that gives accurate, \
structured answers. Follow the pattern of the example.\n\n\
Example:\n\
Input: What is gravity?\n\
Output: Gravity is the force by which a planet or other body draws objects toward its center.\n\n\
Now answer the following:\n\
Input:";

const FEW_SHOT: &str = "You are a helpful, knowledgeable assistant. Answer clearly, accurately \
and in the same style as these examples.\n\n\
Example 1:\n\
Input: What is gravity?\n\
Output: Gravity is the force by which a planet or other body draws objects toward its center.\n\n\
Example 2:\n\
Input: What is friction?\n\
Output: Friction is a force that opposes the motion of one object against another.\n\n\
Now answer the following:\n\
Input:";

const CHAIN_OF_THOUGHT: &str = "You are a logical, analytical assistant. Work through each \
problem step by step and explain the reasoning of every stage before giving the final answer.\n\n\
Structure:\n\
1. Restate the problem\n\
2. Break it into logical steps\n\
3. Solve each step carefully\n\
4. Give the final answer last\n\n\
Begin your reasoning below:";

const REACT: &str = "You are an assistant that alternates between reasoning and acting.\n\n\
Format:\n\
Thought: what you are thinking\n\
Action: the action to take, such as Search[query] or Calculate\n\
Observation: what the action returned\n\
Repeat Thought/Action/Observation as needed.\n\
Final Answer: a clear, concise answer based on the steps above\n\n\
Begin with your first thought:";

const SELF_ASK: &str = "You are a knowledgeable assistant answering complex questions. Before \
answering, ask yourself the intermediate questions needed to break the task down, answer them \
one at a time, then use those answers for the final response.\n\n\
Format:\n\
Question: the original question\n\
Sub-question 1: ...\n\
Answer 1: ...\n\
Sub-question 2: ...\n\
Answer 2: ...\n\
Final Answer: the complete response\n\n\
Start by analyzing the question:";

const TREE_OF_THOUGHT: &str = "You are a strategic, analytical assistant. Explore several \
reasoning paths before choosing a solution.\n\n\
Format:\n\
Problem: the user's query\n\n\
Thought Path 1:\n\
- Step 1: ...\n\
- Step 2: ...\n\
- Conclusion: ...\n\n\
Thought Path 2:\n\
- Step 1: ...\n\
- Step 2: ...\n\
- Conclusion: ...\n\n\
Evaluation: compare the paths and pick the most sound one.\n\n\
Final Answer: the selected solution\n\n\
Begin by exploring possible thought paths:";

const INSTRUCTION_CONSTRAINTS: &str = "You are a precise, focused assistant. Follow the \
instructions and respect every constraint.\n\n\
Instructions:\n\
- Summarize the input in simple language.\n\
- Highlight the three most important points.\n\n\
Constraints:\n\
- Exactly 3 bullet points.\n\
- Markdown only.\n\
- No technical jargon.\n\n\
Respond below while following all constraints:";

/// Persona prompt for a role
pub fn persona(role: &str, tone: &str, style: &str) -> String {
    format!(
        "You are now playing the role of a {role}. Keep a {tone} tone and answer in a {style} \
         style. Stay in character and draw on the expertise of the persona.\n\n\
         Respond to the following input in your role:"
    )
}

#[derive(Deserialize)]
struct PromptFile {
    #[serde(default)]
    prompts: IndexMap<String, String>,
}

/// Named templates in display order
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: IndexMap<String, String>,
}

impl PromptLibrary {
    /// The built-in techniques, `persona` included with its default role
    pub fn builtin() -> Self {
        let templates = [
            ("zero_shot", ZERO_SHOT.to_string()),
            ("one_shot", ONE_SHOT.to_string()),
            ("few_shot", FEW_SHOT.to_string()),
            ("chain_of_thought", CHAIN_OF_THOUGHT.to_string()),
            ("react", REACT.to_string()),
            ("self_ask", SELF_ASK.to_string()),
            ("tree_of_thought", TREE_OF_THOUGHT.to_string()),
            ("instruction_constraints", INSTRUCTION_CONSTRAINTS.to_string()),
            (PERSONA, persona(DEFAULT_PERSONA_ROLE, "professional", "clear and concise")),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), text))
        .collect();
        Self { templates }
    }

    /// Add templates from a TOML file; a name already present is replaced
    pub fn load_custom(&mut self, path: impl AsRef<Path>) -> Result<usize, PromptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PromptFile = toml::from_str(&content).map_err(|e| PromptError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let count = file.prompts.len();
        self.templates.extend(file.prompts);
        tracing::debug!(count, path = %path.display(), "Loaded custom prompts");
        Ok(count)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolve one name, including `persona:<role>`
    pub fn resolve(&self, name: &str) -> Result<String, PromptError> {
        let name = name.trim();
        if let Some(role) = name.strip_prefix("persona:") {
            let role = role.trim();
            if !role.is_empty() {
                return Ok(persona(role, "professional", "clear and concise"));
            }
        }
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::Unknown(name.to_string()))
    }

    /// Templates for the given names, in the given order.
    ///
    /// An empty selection means every template in the library.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<IndexMap<String, String>, PromptError> {
        if names.is_empty() {
            return Ok(self.templates.clone());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                self.resolve(name).map(|text| (name.to_string(), text))
            })
            .collect()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
