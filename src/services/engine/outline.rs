//! Solidity Outline
//!
//! A lightweight structural scan of Solidity source: contracts with their
//! base contracts, and each contract's declared functions with signature,
//! visibility, mutability and modifiers. It is not a parser; it is enough for
//! the point checks, which only look at declarations.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    NonPayable,
    Payable,
    View,
    Pure,
}

/// A function as declared in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOutline {
    pub name: String,
    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub signature: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
    /// Modifier names in declaration order, without arguments.
    pub modifiers: Vec<String>,
    pub is_constructor: bool,
    /// False for declarations without a body.
    pub is_implemented: bool,
}

impl FunctionOutline {
    /// Callable from outside the contract.
    pub fn is_entry_point(&self) -> bool {
        matches!(self.visibility, Visibility::Public | Visibility::External)
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m == name)
    }
}

/// A contract, interface or library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractOutline {
    pub name: String,
    pub kind: ContractKind,
    /// Direct base contracts in declaration order.
    pub bases: Vec<String>,
    pub functions: Vec<FunctionOutline>,
}

impl ContractOutline {
    /// The function this contract itself declares with `signature`.
    pub fn declared(&self, signature: &str) -> Option<&FunctionOutline> {
        self.functions.iter().find(|f| f.signature == signature)
    }
}

fn contract_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:abstract\s+)?(contract|interface|library)\s+([A-Za-z_$][A-Za-z0-9_$]*)([^{;]*)\{")
            .expect("contract regex is valid")
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:function\s+([A-Za-z_$][A-Za-z0-9_$]*)|constructor)\s*\(")
            .expect("function regex is valid")
    })
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("word regex is valid")
    })
}

/// Outline every contract in `source`, in source order.
pub fn parse_outline(source: &str) -> Vec<ContractOutline> {
    let text = strip_comments_and_strings(source);
    let mut contracts = Vec::new();
    let mut pos = 0;

    while let Some(caps) = contract_re().captures_at(&text, pos) {
        let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let open = whole.end() - 1;
        let close = matching(&text, open, b'{', b'}').unwrap_or(text.len());
        let body = &text[open + 1..close.min(text.len())];
        let name = name.as_str().to_string();

        let kind = match kind.as_str() {
            "interface" => ContractKind::Interface,
            "library" => ContractKind::Library,
            _ => ContractKind::Contract,
        };
        let bases = caps.get(3).map(|m| parse_bases(m.as_str())).unwrap_or_default();
        let functions = parse_functions(body, &name);

        contracts.push(ContractOutline {
            name,
            kind,
            bases,
            functions,
        });
        pos = close.saturating_add(1).min(text.len());
        if pos >= text.len() {
            break;
        }
    }

    contracts
}

/// `is A, B(1, 2), C` -> `[A, B, C]`
fn parse_bases(header: &str) -> Vec<String> {
    let header = header.trim();
    let Some(list) = header.strip_prefix("is") else {
        return Vec::new();
    };
    if !list.starts_with(char::is_whitespace) {
        return Vec::new();
    }
    split_top_level(list)
        .into_iter()
        .filter_map(|base| word_re().find(base).map(|m| m.as_str().to_string()))
        .collect()
}

fn parse_functions(body: &str, contract_name: &str) -> Vec<FunctionOutline> {
    let mut functions = Vec::new();
    let mut pos = 0;

    while let Some(caps) = function_re().captures_at(body, pos) {
        let Some(whole) = caps.get(0) else { break };
        let open_paren = whole.end() - 1;
        let Some(close_paren) = matching(body, open_paren, b'(', b')') else {
            break;
        };

        // Header runs up to the body or the terminating semicolon.
        let rest = &body[close_paren + 1..];
        let Some(end_rel) = rest.find(['{', ';']) else {
            break;
        };
        let header = &rest[..end_rel];
        let terminator = close_paren + 1 + end_rel;
        let is_implemented = body.as_bytes()[terminator] == b'{';

        let (name, is_constructor) = match caps.get(1) {
            Some(n) => (n.as_str().to_string(), n.as_str() == contract_name),
            None => ("constructor".to_string(), true),
        };
        let params = &body[open_paren + 1..close_paren];
        let signature = format!("{}({})", name, parameter_types(params).join(","));
        let (visibility, mutability, modifiers) = parse_header(header);

        functions.push(FunctionOutline {
            name,
            signature,
            visibility,
            mutability,
            modifiers,
            is_constructor,
            is_implemented,
        });

        pos = if is_implemented {
            matching(body, terminator, b'{', b'}').map_or(body.len(), |c| c + 1)
        } else {
            terminator + 1
        };
        if pos >= body.len() {
            break;
        }
    }

    functions
}

fn parameter_types(params: &str) -> Vec<String> {
    split_top_level(params)
        .into_iter()
        .filter_map(|param| param.split_whitespace().next())
        .map(canonical_type)
        .collect()
}

/// Expand type aliases to the names used in canonical signatures.
fn canonical_type(ty: &str) -> String {
    let (base, suffix) = match ty.find('[') {
        Some(i) => ty.split_at(i),
        None => (ty, ""),
    };
    let base = match base {
        "uint" => "uint256",
        "int" => "int256",
        "byte" => "bytes1",
        other => other,
    };
    format!("{}{}", base, suffix)
}

fn parse_header(header: &str) -> (Visibility, Mutability, Vec<String>) {
    // Return types are not part of the header we care about.
    let header = match find_word(header, "returns") {
        Some(i) => &header[..i],
        None => header,
    };

    let mut visibility = None;
    let mut mutability = Mutability::NonPayable;
    let mut modifiers = Vec::new();
    let mut depth = 0usize;
    let mut last_end = 0;

    for m in word_re().find_iter(header) {
        depth = paren_depth_after(&header[last_end..m.start()], depth);
        last_end = m.start();
        if depth > 0 {
            continue;
        }
        match m.as_str() {
            "public" => visibility = Some(Visibility::Public),
            "external" => visibility = Some(Visibility::External),
            "internal" => visibility = Some(Visibility::Internal),
            "private" => visibility = Some(Visibility::Private),
            "view" | "constant" => mutability = Mutability::View,
            "pure" => mutability = Mutability::Pure,
            "payable" => mutability = Mutability::Payable,
            "virtual" | "override" => {}
            other => modifiers.push(other.to_string()),
        }
    }

    // Functions without a visibility specifier were public before 0.5.
    (visibility.unwrap_or(Visibility::Public), mutability, modifiers)
}

fn paren_depth_after(segment: &str, mut depth: usize) -> usize {
    for b in segment.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

fn find_word(haystack: &str, word: &str) -> Option<usize> {
    word_re()
        .find_iter(haystack)
        .find(|m| m.as_str() == word)
        .map(|m| m.start())
}

/// Split on commas that are not nested in parentheses.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in list.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Index of the delimiter closing the one at `open`.
fn matching(text: &str, open: usize, left: u8, right: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == left {
            depth += 1;
        } else if b == right {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Blank out comments and the contents of string literals, keeping offsets.
fn strip_comments_and_strings(source: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str(char),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                '"' | '\'' => {
                    out.push(c);
                    state = State::Str(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                } else {
                    push_blank(&mut out, c);
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Code;
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    push_blank(&mut out, c);
                }
            }
            State::Str(quote) => {
                if c == '\\' {
                    push_blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        push_blank(&mut out, escaped);
                    }
                } else if c == quote {
                    out.push(c);
                    state = State::Code;
                } else {
                    push_blank(&mut out, c);
                }
            }
        }
    }

    out
}

/// Replace `c` with as many spaces as its UTF-8 width.
fn push_blank(out: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        out.push(' ');
    }
}
