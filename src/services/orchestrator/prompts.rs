//! Prompt templates for the language-model steps.

/// System prompt for choosing the next tool.
pub const DECISION_SYSTEM_PROMPT: &str = "You are a smart contract security assistant. \
You answer questions about deployed Ethereum contracts. You have a set of tools at your disposal \
and you need to figure out which tool to use next. Pass the contract address exactly as the user \
wrote it and never invent one. Call skip_security_checks when the question needs no contract \
analysis or when the results gathered so far are enough to answer it.";

/// Follow-up instruction sent with the accumulated results on later rounds.
pub const FOLLOW_UP_TEMPLATE: &str = "Results of the checks run so far:\n\
<context>\n{context}\n</context>\n\
Run one more check only if it is needed to answer the question; otherwise call skip_security_checks.";

/// Final answer prompt. `{context}` is the serialized scope, `{input}` the user question.
pub const SUMMARY_TEMPLATE: &str = "Be friendly crypto bro, who is a world class expert in blockchain and smart contract security.
You are helping a crypto newbie to answer a question about smart contract security.
Use your expertise and context to provide a detailed and informative answer.
Below is the context derived from the tool invocation, it has analysis details and source code.
<context>
{context}
</context>
Question: {input}";

pub const DETECTORS_CHECK_DESCRIPTION: &str = "Runs the static-analysis detectors most relevant to the \
question against the contract at the given address. Returns the findings of each detector and the \
verified source code of the contract.";

pub const MINT_CHECK_DESCRIPTION: &str = "Checks if the contract at the given address overrides the \
_mint function. It is a mint check which only applies to tokens that have a mint function.";

pub const UNPROTECTED_FUNC_DESCRIPTION: &str = "Checks if the contract at the given address has any \
public or external functions that are not protected by the onlyOwner modifier.";

pub const SKIP_DESCRIPTION: &str = "Use when no (further) security checks are needed to answer the question.";

pub const ADDRESS_PARAM_DESCRIPTION: &str = "Contract address, 0x followed by 40 hex digits";

pub const QUERY_PARAM_DESCRIPTION: &str = "What to look for, in the user's words";

/// Fill `{name}` placeholders in `template` in one pass.
///
/// Substituted values are never expanded again, so source code or user text
/// containing `{input}` stays as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let hit = vars
            .iter()
            .find(|(name, _)| after.starts_with(name) && after[name.len()..].starts_with('}'));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
