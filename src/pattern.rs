//! The "simple pattern" dialect: a restricted regex subset used to generate
//! and validate strings.
//!
//! Supported grammar (see `spec.md` §4.3):
//!
//! ```text
//! pat   ::= alt ('|' alt)*
//! alt   ::= atom*
//! atom  ::= (char | class | group) quant?
//! class ::= '[' '^'? item+ ']'        item ::= char ('-' char)?
//! group ::= '(' pat ')'
//! quant ::= '?' | '*' | '+' | '{' expr '}' | '{' expr ',' expr '}'
//! ```
//!
//! Matching is a single greedy pass with no backtracking: each quantified
//! atom consumes the maximum it can before the matcher moves on, and once it
//! has moved on it never revisits that decision. Generation walks the same
//! AST, drawing uniformly from `{m,n}` bounds and from alternation branches;
//! `*`/`+` have no finite bound and are therefore illegal when generating
//! (legal when matching).

use std::collections::BTreeSet;

use crate::error::{EvalError, PatternError};
use crate::expr::Expr;
use crate::rng::Rng;

/// A single item inside a `[...]` character class: either a lone character
/// or an inclusive `a-z` range.
#[derive(Debug, Clone, PartialEq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

impl ClassItem {
    fn contains(&self, c: char) -> bool {
        match self {
            ClassItem::Char(ch) => *ch == c,
            ClassItem::Range(lo, hi) => *lo <= c && c <= *hi,
        }
    }

    fn chars(&self) -> Vec<char> {
        match self {
            ClassItem::Char(c) => vec![*c],
            ClassItem::Range(lo, hi) => (*lo..=*hi).collect(),
        }
    }
}

/// A compiled `[...]` character class.
#[derive(Debug, Clone, PartialEq)]
struct CharClass {
    negated: bool,
    items: Vec<ClassItem>,
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        let in_items = self.items.iter().any(|i| i.contains(c));
        in_items != self.negated
    }

    /// All characters this class can produce when generating, optionally
    /// intersected with a supplied alphabet.
    fn candidates(&self, alphabet: Option<&BTreeSet<char>>) -> Vec<char> {
        let mut set: BTreeSet<char> = BTreeSet::new();
        if self.negated {
            // Negated classes only make sense to *generate from* when an
            // alphabet bounds the universe; otherwise the candidate space
            // (all of Unicode) is unusable.
            if let Some(alphabet) = alphabet {
                for &c in alphabet {
                    if !self.items.iter().any(|i| i.contains(c)) {
                        set.insert(c);
                    }
                }
            }
        } else {
            for item in &self.items {
                for c in item.chars() {
                    set.insert(c);
                }
            }
            if let Some(alphabet) = alphabet {
                set.retain(|c| alphabet.contains(c));
            }
        }
        set.into_iter().collect()
    }
}

/// A repetition quantifier.
#[derive(Debug, Clone, PartialEq)]
enum Quant {
    /// `?`
    Optional,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `{n}`
    Exact(Expr),
    /// `{m,n}`
    Range(Expr, Expr),
}

impl Quant {
    fn dependencies(&self, out: &mut BTreeSet<String>) {
        match self {
            Quant::Optional | Quant::Star | Quant::Plus => {}
            Quant::Exact(e) => out.extend(e.dependencies()),
            Quant::Range(lo, hi) => {
                out.extend(lo.dependencies());
                out.extend(hi.dependencies());
            }
        }
    }

    /// The `(min, max)` repeat bounds, `max = None` meaning unbounded.
    fn bounds(&self, lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>) -> Result<(i64, Option<i64>), PatternError> {
        Ok(match self {
            Quant::Optional => (0, Some(1)),
            Quant::Star => (0, None),
            Quant::Plus => (1, None),
            Quant::Exact(e) => {
                let n = e.eval(lookup)?;
                if n < 0 {
                    return Err(PatternError::EvaluationError {
                        message: format!("repetition count {n} is negative"),
                    });
                }
                (n, Some(n))
            }
            Quant::Range(lo, hi) => {
                let lo = lo.eval(lookup)?;
                let hi = hi.eval(lookup)?;
                if lo < 0 || hi < lo {
                    return Err(PatternError::EvaluationError {
                        message: format!("repetition bounds {{{lo},{hi}}} are invalid"),
                    });
                }
                (lo, Some(hi))
            }
        })
    }
}

/// A node of the compiled pattern AST.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(char),
    Class(CharClass),
    /// A parenthesized subpattern, itself an alternation of concatenations.
    Group(Box<Node>),
    Concat(Vec<Node>),
    Alt(Vec<Node>),
    Repeat(Box<Node>, Quant),
}

impl Node {
    fn dependencies(&self, out: &mut BTreeSet<String>) {
        match self {
            Node::Literal(_) | Node::Class(_) => {}
            Node::Group(inner) => inner.dependencies(out),
            Node::Concat(items) | Node::Alt(items) => {
                for i in items {
                    i.dependencies(out);
                }
            }
            Node::Repeat(inner, quant) => {
                inner.dependencies(out);
                quant.dependencies(out);
            }
        }
    }
}

/// A compiled simple pattern, ready to match or generate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePattern {
    source: String,
    root: Node,
}

impl SimplePattern {
    /// Compiles `text` into a [`SimplePattern`].
    pub fn compile(text: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = text.chars().collect();
        let mut p = PatParser { chars: &chars, pos: 0 };
        let root = p.parse_alt().map_err(|message| PatternError::InvalidPattern {
            text: text.to_string(),
            message,
        })?;
        if p.pos != p.chars.len() {
            return Err(PatternError::InvalidPattern {
                text: text.to_string(),
                message: format!("unexpected trailing input at position {}", p.pos),
            });
        }
        Ok(Self {
            source: text.to_string(),
            root,
        })
    }

    /// The original pattern source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifiers referenced inside `{...}` repetition bounds.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.root.dependencies(&mut out);
        out
    }

    /// Checks whether `s` matches this pattern in a single greedy pass.
    pub fn matches(
        &self,
        s: &str,
        lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>,
    ) -> Result<bool, PatternError> {
        let chars: Vec<char> = s.chars().collect();
        let consumed = match_alt(&self.root, &chars, 0, lookup)?;
        Ok(consumed == Some(chars.len()))
    }

    /// Generates a string satisfying this pattern.
    ///
    /// `alphabet`, if given, bounds which characters a `[...]` class may
    /// produce (intersected with the class); a bare literal in the pattern
    /// is always emitted regardless of the alphabet.
    pub fn generate(
        &self,
        alphabet: Option<&BTreeSet<char>>,
        lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>,
        rng: &mut Rng,
    ) -> Result<String, PatternError> {
        let mut out = String::new();
        generate_node(&self.root, alphabet, lookup, rng, &mut out)?;
        Ok(out)
    }
}

// --- matching ----------------------------------------------------------------

/// Attempts to match `node` at `chars[pos..]`, returning the new position if
/// it matched, consuming greedily and never backtracking.
fn match_node(
    node: &Node,
    chars: &[char],
    pos: usize,
    lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>,
) -> Result<Option<usize>, PatternError> {
    match node {
        Node::Literal(c) => {
            if chars.get(pos) == Some(c) {
                Ok(Some(pos + 1))
            } else {
                Ok(None)
            }
        }
        Node::Class(class) => match chars.get(pos) {
            Some(&c) if class.matches(c) => Ok(Some(pos + 1)),
            _ => Ok(None),
        },
        Node::Group(inner) => match_alt(inner, chars, pos, lookup),
        Node::Concat(items) => {
            let mut cur = pos;
            for item in items {
                match match_node(item, chars, cur, lookup)? {
                    Some(next) => cur = next,
                    None => return Ok(None),
                }
            }
            Ok(Some(cur))
        }
        Node::Alt(branches) => {
            for branch in branches {
                if let Some(end) = match_node(branch, chars, pos, lookup)? {
                    return Ok(Some(end));
                }
            }
            Ok(None)
        }
        Node::Repeat(inner, quant) => {
            let (min, max) = quant.bounds(lookup)?;
            let mut count: i64 = 0;
            let mut cur = pos;
            loop {
                if let Some(max) = max {
                    if count >= max {
                        break;
                    }
                }
                match match_node(inner, chars, cur, lookup)? {
                    Some(next) if next > cur => {
                        cur = next;
                        count += 1;
                    }
                    _ => break,
                }
            }
            if count >= min {
                Ok(Some(cur))
            } else {
                Ok(None)
            }
        }
    }
}

/// Matches a (possibly single-branch) node; named separately from
/// [`match_node`] to make the call sites that specifically care about
/// top-level alternation (the public entry point and parenthesized groups)
/// self-documenting.
fn match_alt(
    node: &Node,
    chars: &[char],
    pos: usize,
    lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>,
) -> Result<Option<usize>, PatternError> {
    match_node(node, chars, pos, lookup)
}

// --- generation ----------------------------------------------------------------

fn generate_node(
    node: &Node,
    alphabet: Option<&BTreeSet<char>>,
    lookup: &mut dyn FnMut(&str) -> Result<i64, EvalError>,
    rng: &mut Rng,
    out: &mut String,
) -> Result<(), PatternError> {
    match node {
        Node::Literal(c) => {
            // A literal bypasses the alphabet constraint: it is emitted
            // verbatim regardless of whether it belongs to `alphabet`.
            out.push(*c);
            Ok(())
        }
        Node::Class(class) => {
            let candidates = class.candidates(alphabet);
            if candidates.is_empty() {
                return Err(PatternError::EvaluationError {
                    message: "character class has no candidates under the supplied alphabet"
                        .to_string(),
                });
            }
            let idx = rng
                .below(candidates.len() as i64)
                .map_err(|message| PatternError::EvaluationError { message })? as usize;
            out.push(candidates[idx]);
            Ok(())
        }
        Node::Group(inner) => generate_node(inner, alphabet, lookup, rng, out),
        Node::Concat(items) => {
            for item in items {
                generate_node(item, alphabet, lookup, rng, out)?;
            }
            Ok(())
        }
        Node::Alt(branches) => {
            if branches.is_empty() {
                return Err(PatternError::EvaluationError {
                    message: "alternation has no branches".to_string(),
                });
            }
            let idx = rng
                .below(branches.len() as i64)
                .map_err(|message| PatternError::EvaluationError { message })? as usize;
            generate_node(&branches[idx], alphabet, lookup, rng, out)
        }
        Node::Repeat(inner, quant) => {
            if matches!(quant, Quant::Star | Quant::Plus) {
                return Err(PatternError::EvaluationError {
                    message: "'*' and '+' have no finite bound and cannot be generated from"
                        .to_string(),
                });
            }
            let (min, max) = quant.bounds(lookup)?;
            let max = max.expect("Star/Plus rejected above, Exact/Range always bounded");
            let n = if min == max {
                min
            } else {
                rng.between(min, max)
                    .map_err(|message| PatternError::EvaluationError { message })?
            };
            for _ in 0..n {
                generate_node(inner, alphabet, lookup, rng, out)?;
            }
            Ok(())
        }
    }
}

// --- parser --------------------------------------------------------------------

struct PatParser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> PatParser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse_alt(&mut self) -> Result<Node, String> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Node::Alt(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Node, String> {
        let mut atoms = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            atoms.push(self.parse_atom()?);
        }
        if atoms.len() == 1 {
            Ok(atoms.pop().unwrap())
        } else {
            Ok(Node::Concat(atoms))
        }
    }

    fn parse_atom(&mut self) -> Result<Node, String> {
        let base = match self.peek() {
            Some('(') => {
                self.bump();
                let inner = self.parse_alt()?;
                if self.bump() != Some(')') {
                    return Err("unterminated group: expected ')'".to_string());
                }
                Node::Group(Box::new(inner))
            }
            Some('[') => self.parse_class()?,
            Some('\\') => {
                self.bump();
                match self.bump() {
                    Some(c) => Node::Literal(c),
                    None => return Err("dangling '\\' at end of pattern".to_string()),
                }
            }
            Some(c) => {
                self.bump();
                Node::Literal(c)
            }
            None => return Err("unexpected end of pattern".to_string()),
        };

        match self.peek() {
            Some('?') => {
                self.bump();
                Ok(Node::Repeat(Box::new(base), Quant::Optional))
            }
            Some('*') => {
                self.bump();
                Ok(Node::Repeat(Box::new(base), Quant::Star))
            }
            Some('+') => {
                self.bump();
                Ok(Node::Repeat(Box::new(base), Quant::Plus))
            }
            Some('{') => {
                self.bump();
                let quant = self.parse_brace_quant()?;
                Ok(Node::Repeat(Box::new(base), quant))
            }
            _ => Ok(base),
        }
    }

    fn parse_brace_quant(&mut self) -> Result<Quant, String> {
        let first = self.parse_bound_expr('}')?;
        match self.peek() {
            Some('}') => {
                self.bump();
                Ok(Quant::Exact(
                    Expr::parse(&first).map_err(|e| e.to_string())?,
                ))
            }
            Some(',') => {
                self.bump();
                let second = self.parse_bound_expr('}')?;
                if self.bump() != Some('}') {
                    return Err("unterminated quantifier: expected '}'".to_string());
                }
                Ok(Quant::Range(
                    Expr::parse(&first).map_err(|e| e.to_string())?,
                    Expr::parse(&second).map_err(|e| e.to_string())?,
                ))
            }
            _ => Err("unterminated quantifier: expected ',' or '}'".to_string()),
        }
    }

    fn parse_bound_expr(&mut self, _stop: char) -> Result<String, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ',' || c == '}' {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err("expected an expression inside '{...}'".to_string());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_class(&mut self) -> Result<Node, String> {
        self.bump(); // consume '['
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err("unterminated character class: expected ']'".to_string()),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    self.bump();
                    let c = if c == '\\' {
                        self.bump().ok_or("dangling '\\' in character class")?
                    } else {
                        c
                    };
                    if self.peek() == Some('-') && self.chars.get(self.pos + 1) != Some(&']') {
                        self.bump();
                        let hi = self.bump().ok_or("unterminated range in character class")?;
                        if hi < c {
                            return Err(format!("invalid range '{c}-{hi}': start > end"));
                        }
                        items.push(ClassItem::Range(c, hi));
                    } else {
                        items.push(ClassItem::Char(c));
                    }
                }
            }
        }
        if items.is_empty() {
            return Err("character class must contain at least one item".to_string());
        }
        Ok(Node::Class(CharClass { negated, items }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(env: &HashMap<String, i64>) -> impl FnMut(&str) -> Result<i64, EvalError> + '_ {
        move |name: &str| {
            env.get(name)
                .copied()
                .ok_or_else(|| EvalError::VariableNotFound {
                    name: name.to_string(),
                })
        }
    }

    #[test]
    fn matches_literal_sequence() {
        let p = SimplePattern::compile("abc").unwrap();
        let env = HashMap::new();
        assert!(p.matches("abc", &mut lookup(&env)).unwrap());
        assert!(!p.matches("abd", &mut lookup(&env)).unwrap());
        assert!(!p.matches("ab", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn matches_char_class_and_negation() {
        let p = SimplePattern::compile("[a-z]").unwrap();
        let env = HashMap::new();
        assert!(p.matches("m", &mut lookup(&env)).unwrap());
        assert!(!p.matches("M", &mut lookup(&env)).unwrap());

        let neg = SimplePattern::compile("[^a-z]").unwrap();
        assert!(neg.matches("M", &mut lookup(&env)).unwrap());
        assert!(!neg.matches("m", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn matches_alternation() {
        let p = SimplePattern::compile("cat|dog").unwrap();
        let env = HashMap::new();
        assert!(p.matches("cat", &mut lookup(&env)).unwrap());
        assert!(p.matches("dog", &mut lookup(&env)).unwrap());
        assert!(!p.matches("cow", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn matches_quantifiers() {
        let env = HashMap::new();
        let opt = SimplePattern::compile("ab?c").unwrap();
        assert!(opt.matches("ac", &mut lookup(&env)).unwrap());
        assert!(opt.matches("abc", &mut lookup(&env)).unwrap());

        let star = SimplePattern::compile("a*b").unwrap();
        assert!(star.matches("b", &mut lookup(&env)).unwrap());
        assert!(star.matches("aaab", &mut lookup(&env)).unwrap());

        let plus = SimplePattern::compile("a+b").unwrap();
        assert!(!plus.matches("b", &mut lookup(&env)).unwrap());
        assert!(plus.matches("aab", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn matches_expression_bounded_quantifier() {
        let mut env = HashMap::new();
        env.insert("N".to_string(), 2);
        env.insert("X".to_string(), 7);
        let p = SimplePattern::compile("[a-z]{N,X}").unwrap();
        assert!(p.matches("abcdef", &mut lookup(&env)).unwrap());
        assert!(!p.matches("a", &mut lookup(&env)).unwrap());
        assert!(!p.matches("ABCD", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn dependencies_collects_bound_identifiers() {
        let p = SimplePattern::compile("[a-z]{N,X}").unwrap();
        let deps = p.dependencies();
        assert_eq!(deps, ["N", "X"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn generate_respects_bounds_and_alphabet() {
        let mut env = HashMap::new();
        env.insert("N".to_string(), 2);
        env.insert("X".to_string(), 7);
        let p = SimplePattern::compile("[a-z]{N,X}").unwrap();
        let mut rng = Rng::new(b"abcde0123456789").unwrap();
        for _ in 0..50 {
            let s = p.generate(None, &mut lookup(&env), &mut rng).unwrap();
            assert!((2..=7).contains(&s.len()));
            assert!(s.chars().all(|c| ('a'..='z').contains(&c)));
            assert!(p.matches(&s, &mut lookup(&env)).unwrap());
        }
    }

    #[test]
    fn star_and_plus_are_illegal_in_generate() {
        let env = HashMap::new();
        let mut rng = Rng::new(b"abcde0123456789").unwrap();
        let star = SimplePattern::compile("a*").unwrap();
        assert!(star.generate(None, &mut lookup(&env), &mut rng).is_err());
        let plus = SimplePattern::compile("a+").unwrap();
        assert!(plus.generate(None, &mut lookup(&env), &mut rng).is_err());
    }

    #[test]
    fn literal_bypasses_alphabet_but_class_is_intersected() {
        let env = HashMap::new();
        let mut rng = Rng::new(b"abcde0123456789").unwrap();
        let p = SimplePattern::compile("#[a-c]").unwrap();
        let alphabet: BTreeSet<char> = "xyz".chars().collect();
        // The class [a-c] has an empty intersection with {x,y,z}: must fail.
        assert!(p.generate(Some(&alphabet), &mut lookup(&env), &mut rng).is_err());

        let p2 = SimplePattern::compile("#[a-z]").unwrap();
        let alphabet2: BTreeSet<char> = "abc".chars().collect();
        let s = p2.generate(Some(&alphabet2), &mut lookup(&env), &mut rng).unwrap();
        assert!(s.starts_with('#'));
        assert!(('a'..='c').contains(&s.chars().nth(1).unwrap()));
    }

    #[test]
    fn empty_pattern_is_valid_and_matches_empty_string() {
        let env = HashMap::new();
        let p = SimplePattern::compile("").unwrap();
        assert!(p.matches("", &mut lookup(&env)).unwrap());
        assert!(!p.matches("a", &mut lookup(&env)).unwrap());
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        assert!(SimplePattern::compile("[a-z").is_err());
        assert!(SimplePattern::compile("(abc").is_err());
        assert!(SimplePattern::compile("a{2,").is_err());
    }
}
