//! # Padrões de Tokens
//!
//! Um padrão é uma sequência ordenada de restrições, uma por token
//! consecutivo. Cada restrição é um objeto JSON que mapeia atributos do token
//! para predicados, no formato usual de regras de matcher:
//!
//! ```json
//! [{"LOWER": {"IN": ["film", "movie"]}}, {"IS_PUNCT": true, "OP": "?"}]
//! ```
//!
//! ## Atributos
//!
//! | Atributo      | Tipo   | Valor                                      |
//! |---------------|--------|--------------------------------------------|
//! | `ORTH`/`TEXT` | texto  | texto exato do token                       |
//! | `LOWER`       | texto  | texto em minúsculas                        |
//! | `LENGTH`      | número | comprimento em caracteres                  |
//! | `IS_*`        | bool   | `IS_ALPHA`, `IS_ASCII`, `IS_DIGIT`, `IS_LOWER`, `IS_UPPER`, `IS_TITLE`, `IS_PUNCT`, `IS_SENT_START` |
//! | `LIKE_NUM`    | bool   | parece um número                           |
//!
//! ## Predicados
//!
//! Valor literal (igualdade), ou um objeto com `IN`, `NOT_IN`, `REGEX` e, para
//! atributos numéricos, `==`, `!=`, `>=`, `<=`, `>`, `<`.
//!
//! ## Quantificadores (`OP`)
//!
//! `!` (exatamente um token que NÃO satisfaz), `?` (0 ou 1), `+` (1 ou mais),
//! `*` (0 ou mais), `1` (exatamente um, padrão), `{n}`, `{n,m}`, `{n,}`, `{,m}`.
//!
//! Os padrões ficam em JSON cru até serem adicionados ao matcher; só então
//! são validados e compilados.

use std::collections::{BTreeSet, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MatcherError, Result};
use crate::tokenizer::Token;

/// Restrição de um token: atributo -> predicado, mais `OP` opcional.
pub type TokenSpec = Map<String, Value>;

/// Padrão cru (não validado): sequência de restrições de token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(pub Vec<TokenSpec>);

impl Pattern {
    pub fn new(tokens: Vec<TokenSpec>) -> Self {
        Self(tokens)
    }

    /// Converte um valor JSON (lista de objetos) em padrão.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn tokens(&self) -> &[TokenSpec] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Atributo de token consultável por um padrão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Orth,
    Lower,
    Length,
    IsAlpha,
    IsAscii,
    IsDigit,
    IsLower,
    IsUpper,
    IsTitle,
    IsPunct,
    IsSentStart,
    LikeNum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrKind {
    Text,
    Int,
    Bool,
}

#[derive(Debug, Clone, Copy)]
enum AttrValue<'t> {
    Text(&'t str),
    Int(i64),
    Bool(bool),
}

impl Attr {
    /// Nome do atributo no JSON. Aceita minúsculas (`lower`) e o sinônimo `TEXT`.
    pub fn parse(key: &str) -> Option<Self> {
        let attr = match key.to_ascii_uppercase().as_str() {
            "ORTH" | "TEXT" => Attr::Orth,
            "LOWER" => Attr::Lower,
            "LENGTH" => Attr::Length,
            "IS_ALPHA" => Attr::IsAlpha,
            "IS_ASCII" => Attr::IsAscii,
            "IS_DIGIT" => Attr::IsDigit,
            "IS_LOWER" => Attr::IsLower,
            "IS_UPPER" => Attr::IsUpper,
            "IS_TITLE" => Attr::IsTitle,
            "IS_PUNCT" => Attr::IsPunct,
            "IS_SENT_START" => Attr::IsSentStart,
            "LIKE_NUM" => Attr::LikeNum,
            _ => return None,
        };
        Some(attr)
    }

    pub fn name(self) -> &'static str {
        match self {
            Attr::Orth => "ORTH",
            Attr::Lower => "LOWER",
            Attr::Length => "LENGTH",
            Attr::IsAlpha => "IS_ALPHA",
            Attr::IsAscii => "IS_ASCII",
            Attr::IsDigit => "IS_DIGIT",
            Attr::IsLower => "IS_LOWER",
            Attr::IsUpper => "IS_UPPER",
            Attr::IsTitle => "IS_TITLE",
            Attr::IsPunct => "IS_PUNCT",
            Attr::IsSentStart => "IS_SENT_START",
            Attr::LikeNum => "LIKE_NUM",
        }
    }

    fn kind(self) -> AttrKind {
        match self {
            Attr::Orth | Attr::Lower => AttrKind::Text,
            Attr::Length => AttrKind::Int,
            _ => AttrKind::Bool,
        }
    }

    fn value(self, tokens: &[Token], i: usize) -> AttrValue<'_> {
        let token = &tokens[i];
        match self {
            Attr::Orth => AttrValue::Text(&token.text),
            Attr::Lower => AttrValue::Text(&token.lower),
            Attr::Length => AttrValue::Int(token.len_chars() as i64),
            Attr::IsAlpha => AttrValue::Bool(token.is_alpha()),
            Attr::IsAscii => AttrValue::Bool(token.is_ascii()),
            Attr::IsDigit => AttrValue::Bool(token.is_digit()),
            Attr::IsLower => AttrValue::Bool(token.is_lower()),
            Attr::IsUpper => AttrValue::Bool(token.is_upper()),
            Attr::IsTitle => AttrValue::Bool(token.is_title()),
            Attr::IsPunct => AttrValue::Bool(token.is_punct()),
            Attr::LikeNum => AttrValue::Bool(token.like_num()),
            Attr::IsSentStart => AttrValue::Bool(
                i == 0 || matches!(tokens[i - 1].text.as_str(), "." | "!" | "?"),
            ),
        }
    }
}

/// Quantos tokens consecutivos uma restrição consome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub min: usize,
    pub max: Option<usize>,
    /// `!`: o token consumido deve falhar a restrição.
    pub negate: bool,
}

impl Quantifier {
    pub const ONE: Quantifier = Quantifier {
        min: 1,
        max: Some(1),
        negate: false,
    };

    pub fn parse(op: &str) -> Option<Self> {
        let range = |min, max| Quantifier {
            min,
            max,
            negate: false,
        };
        let q = match op {
            "1" => Self::ONE,
            "!" => Quantifier {
                negate: true,
                ..Self::ONE
            },
            "?" => range(0, Some(1)),
            "+" => range(1, None),
            "*" => range(0, None),
            _ => {
                let inner = op.strip_prefix('{')?.strip_suffix('}')?;
                let parse_bound = |s: &str| -> Option<Option<usize>> {
                    let s = s.trim();
                    if s.is_empty() {
                        Some(None)
                    } else {
                        s.parse().ok().map(Some)
                    }
                };
                match inner.split_once(',') {
                    None => {
                        let n = parse_bound(inner)??;
                        range(n, Some(n))
                    }
                    Some((lo, hi)) => range(parse_bound(lo)?.unwrap_or(0), parse_bound(hi)?),
                }
            }
        };
        let valid = q.max.map_or(true, |max| max > 0 && max >= q.min);
        valid.then_some(q)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CmpOp {
    fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            ">=" => CmpOp::Ge,
            "<=" => CmpOp::Le,
            ">" => CmpOp::Gt,
            "<" => CmpOp::Lt,
            _ => return None,
        })
    }

    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Lt => lhs < rhs,
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    TextEq(String),
    TextIn { set: HashSet<String>, negate: bool },
    IntEq(i64),
    IntIn { set: HashSet<i64>, negate: bool },
    BoolEq(bool),
    Regex(Regex),
    Cmp(CmpOp, i64),
}

impl Predicate {
    fn eval(&self, value: AttrValue<'_>) -> bool {
        match (self, value) {
            (Predicate::TextEq(expected), AttrValue::Text(t)) => expected == t,
            (Predicate::TextIn { set, negate }, AttrValue::Text(t)) => set.contains(t) != *negate,
            (Predicate::IntEq(expected), AttrValue::Int(v)) => *expected == v,
            (Predicate::IntIn { set, negate }, AttrValue::Int(v)) => set.contains(&v) != *negate,
            (Predicate::BoolEq(expected), AttrValue::Bool(v)) => *expected == v,
            (Predicate::Regex(re), AttrValue::Text(t)) => re.is_match(t),
            (Predicate::Regex(re), AttrValue::Int(v)) => re.is_match(&v.to_string()),
            (Predicate::Cmp(op, rhs), AttrValue::Int(v)) => op.apply(v, *rhs),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Check {
    attr: Attr,
    predicate: Predicate,
}

#[derive(Debug, Clone)]
struct CompiledToken {
    checks: Vec<Check>,
    quantifier: Quantifier,
}

impl CompiledToken {
    fn accepts(&self, tokens: &[Token], i: usize) -> bool {
        let satisfied = self
            .checks
            .iter()
            .all(|c| c.predicate.eval(c.attr.value(tokens, i)));
        satisfied != self.quantifier.negate
    }
}

/// Padrão validado, pronto para ser avaliado contra documentos.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    tokens: Vec<CompiledToken>,
}

impl CompiledPattern {
    /// Valida e compila `pattern`. `label` e `index` só entram na mensagem de erro.
    pub(crate) fn compile(label: &str, index: usize, pattern: &Pattern) -> Result<Self> {
        let invalid = |token: usize, message: String| MatcherError::InvalidPattern {
            label: label.to_string(),
            pattern: index,
            token,
            message,
        };

        if pattern.is_empty() {
            return Err(invalid(0, "padrão vazio".to_string()));
        }

        let tokens = pattern
            .tokens()
            .iter()
            .enumerate()
            .map(|(t, spec)| compile_token(spec).map_err(|message| invalid(t, message)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tokens })
    }

    /// Todas as posições finais (exclusivas) de matches que começam em `start`.
    /// Matches de comprimento zero são descartados.
    pub(crate) fn ends_from(&self, tokens: &[Token], start: usize) -> BTreeSet<usize> {
        let mut ends = BTreeSet::new();
        let mut visited = HashSet::new();
        self.walk(tokens, start, 0, &mut visited, &mut ends);
        ends.remove(&start);
        ends
    }

    fn walk(
        &self,
        tokens: &[Token],
        pos: usize,
        step: usize,
        visited: &mut HashSet<(usize, usize)>,
        ends: &mut BTreeSet<usize>,
    ) {
        if !visited.insert((pos, step)) {
            return;
        }
        let Some(spec) = self.tokens.get(step) else {
            ends.insert(pos);
            return;
        };

        let mut consumed = 0;
        let mut cursor = pos;
        loop {
            if consumed >= spec.quantifier.min {
                self.walk(tokens, cursor, step + 1, visited, ends);
            }
            let at_max = spec.quantifier.max.is_some_and(|max| consumed >= max);
            if at_max || cursor >= tokens.len() || !spec.accepts(tokens, cursor) {
                break;
            }
            cursor += 1;
            consumed += 1;
        }
    }
}

fn compile_token(spec: &TokenSpec) -> std::result::Result<CompiledToken, String> {
    let mut checks = Vec::new();
    let mut quantifier = Quantifier::ONE;

    for (key, value) in spec {
        if key.eq_ignore_ascii_case("OP") {
            let op = value
                .as_str()
                .ok_or_else(|| format!("OP deve ser texto, encontrado {value}"))?;
            quantifier = Quantifier::parse(op).ok_or_else(|| format!("OP desconhecido: '{op}'"))?;
            continue;
        }
        let attr = Attr::parse(key).ok_or_else(|| format!("atributo desconhecido: {key}"))?;
        compile_checks(attr, value, &mut checks)?;
    }

    Ok(CompiledToken { checks, quantifier })
}

fn compile_checks(attr: Attr, value: &Value, checks: &mut Vec<Check>) -> std::result::Result<(), String> {
    let predicates = match value {
        Value::Object(map) => {
            if attr.kind() == AttrKind::Bool {
                return Err(format!("{} aceita apenas true/false", attr.name()));
            }
            if map.is_empty() {
                return Err(format!("{}: objeto de predicados vazio", attr.name()));
            }
            map.iter()
                .map(|(op, arg)| compile_predicate(attr, op, arg))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        scalar => vec![literal_predicate(attr, scalar)?],
    };
    checks.extend(predicates.into_iter().map(|predicate| Check { attr, predicate }));
    Ok(())
}

fn literal_predicate(attr: Attr, value: &Value) -> std::result::Result<Predicate, String> {
    let mismatch = || format!("valor {value} incompatível com {}", attr.name());
    match attr.kind() {
        AttrKind::Text => value.as_str().map(|s| Predicate::TextEq(s.to_string())).ok_or_else(mismatch),
        AttrKind::Int => value.as_i64().map(Predicate::IntEq).ok_or_else(mismatch),
        AttrKind::Bool => value.as_bool().map(Predicate::BoolEq).ok_or_else(mismatch),
    }
}

fn compile_predicate(attr: Attr, op: &str, arg: &Value) -> std::result::Result<Predicate, String> {
    match op {
        "IN" | "NOT_IN" => {
            let negate = op == "NOT_IN";
            let items = arg
                .as_array()
                .ok_or_else(|| format!("{op} espera uma lista, encontrado {arg}"))?;
            match attr.kind() {
                AttrKind::Text => {
                    let set = items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<HashSet<_>>>()
                        .ok_or_else(|| format!("{op} de {} espera textos", attr.name()))?;
                    Ok(Predicate::TextIn { set, negate })
                }
                AttrKind::Int => {
                    let set = items
                        .iter()
                        .map(Value::as_i64)
                        .collect::<Option<HashSet<_>>>()
                        .ok_or_else(|| format!("{op} de {} espera inteiros", attr.name()))?;
                    Ok(Predicate::IntIn { set, negate })
                }
                AttrKind::Bool => Err(format!("{op} não se aplica a {}", attr.name())),
            }
        }
        "REGEX" => {
            let source = arg
                .as_str()
                .ok_or_else(|| format!("REGEX espera texto, encontrado {arg}"))?;
            Regex::new(source)
                .map(Predicate::Regex)
                .map_err(|e| format!("REGEX inválida '{source}': {e}"))
        }
        _ => {
            let cmp = CmpOp::parse(op).ok_or_else(|| format!("predicado desconhecido: {op}"))?;
            if attr.kind() != AttrKind::Int {
                return Err(format!("comparação '{op}' exige atributo numérico, não {}", attr.name()));
            }
            let rhs = arg
                .as_i64()
                .ok_or_else(|| format!("comparação '{op}' espera inteiro, encontrado {arg}"))?;
            Ok(Predicate::Cmp(cmp, rhs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use serde_json::json;

    fn compile(value: Value) -> Result<CompiledPattern> {
        CompiledPattern::compile("test", 0, &Pattern::from_value(value)?)
    }

    fn ends(value: Value, text: &str, start: usize) -> Vec<usize> {
        let tokens = tokenize(text);
        compile(value).unwrap().ends_from(&tokens, start).into_iter().collect()
    }

    #[test]
    fn test_lower_in_set() {
        let p = json!([{"LOWER": {"IN": ["film", "movies"]}}]);
        assert_eq!(ends(p.clone(), "I love Movies", 2), [3]);
        assert!(ends(p, "I love Movies", 1).is_empty());
    }

    #[test]
    fn test_optional_and_plus() {
        let p = json!([{"LOWER": "great"}, {"LOWER": "big", "OP": "?"}, {"LOWER": "film", "OP": "+"}]);
        assert_eq!(ends(p.clone(), "great big film film", 0), [3, 4]);
        assert_eq!(ends(p, "great film", 0), [2]);
    }

    #[test]
    fn test_star_never_yields_empty_match() {
        let p = json!([{"LOWER": "film", "OP": "*"}]);
        assert!(ends(p.clone(), "no match here", 0).is_empty());
        assert_eq!(ends(p, "film film x", 0), [1, 2]);
    }

    #[test]
    fn test_negation_consumes_one_token() {
        let p = json!([{"LOWER": "the"}, {"LOWER": "movie", "OP": "!"}]);
        assert_eq!(ends(p.clone(), "the film", 0), [2]);
        assert!(ends(p, "the movie", 0).is_empty());
    }

    #[test]
    fn test_range_quantifier() {
        let p = json!([{"IS_DIGIT": true, "OP": "{2,3}"}]);
        assert_eq!(ends(p, "1 2 3 4", 0), [2, 3]);
    }

    #[test]
    fn test_length_regex_and_not_in() {
        let p = json!([{"LENGTH": {">=": 5}, "ORTH": {"REGEX": "^[A-Z]"}, "LOWER": {"NOT_IN": ["cinema"]}}]);
        assert_eq!(ends(p.clone(), "Hollywood", 0), [1]);
        assert!(ends(p.clone(), "Cinema", 0).is_empty());
        assert!(ends(p, "Rome", 0).is_empty());
    }

    #[test]
    fn test_empty_spec_matches_any_token() {
        let p = json!([{"LOWER": "a"}, {}, {"LOWER": "c"}]);
        assert_eq!(ends(p, "a b c", 0), [3]);
    }

    #[test]
    fn test_sent_start() {
        let p = json!([{"IS_SENT_START": true, "LOWER": "films"}]);
        assert_eq!(ends(p.clone(), "Films rock. Films rule", 3), [4]);
        assert!(ends(p, "I like films", 2).is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            json!([]),
            json!([{"COLOR": "red"}]),
            json!([{"LOWER": 3}]),
            json!([{"LOWER": {"IN": "film"}}]),
            json!([{"LOWER": {"BETWEEN": [1, 2]}}]),
            json!([{"LOWER": {">": 2}}]),
            json!([{"IS_ALPHA": {"IN": [true]}}]),
            json!([{"ORTH": {"REGEX": "("}}]),
            json!([{"LOWER": "a", "OP": "~"}]),
            json!([{"LOWER": "a", "OP": "{3,1}"}]),
        ];
        for case in cases {
            let err = compile(case.clone()).expect_err(&format!("deveria falhar: {case}"));
            assert!(matches!(err, MatcherError::InvalidPattern { .. }), "{err}");
        }
    }

    #[test]
    fn test_error_points_at_token() {
        let err = compile(json!([{"LOWER": "ok"}, {"FOO": 1}])).unwrap_err();
        match err {
            MatcherError::InvalidPattern { token, label, .. } => {
                assert_eq!(token, 1);
                assert_eq!(label, "test");
            }
            other => panic!("erro inesperado: {other}"),
        }
    }

    #[test]
    fn test_quantifier_parse() {
        assert_eq!(Quantifier::parse("{2}"), Some(Quantifier { min: 2, max: Some(2), negate: false }));
        assert_eq!(Quantifier::parse("{,2}"), Some(Quantifier { min: 0, max: Some(2), negate: false }));
        assert_eq!(Quantifier::parse("{1,}"), Some(Quantifier { min: 1, max: None, negate: false }));
        assert_eq!(Quantifier::parse("{0}"), None);
        assert!(Quantifier::parse("!").unwrap().negate);
    }
}
