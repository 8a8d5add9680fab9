//! Command parser using Pest
//!
//! Turns one line of command text into a [`Command`]. Conditions go through
//! a Pratt parser so that `AND` binds tighter than `OR`.

use crate::graph::{Direction, EdgeId, EdgeType, Label, NodeId, NodeRef, PropertyMap, PropertyValue};
use crate::query::ast::*;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "query/command.pest"]
struct CommandParser;

static PRATT_PARSER: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
});

/// Parser errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// Pest parsing error
    #[error("Parse error: {0}")]
    PestError(#[from] pest::error::Error<Rule>),

    /// Semantic error
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

fn semantic(message: impl Into<String>) -> ParseError {
    ParseError::SemanticError(message.into())
}

/// Parse a command string into an AST
pub fn parse_command(input: &str) -> ParseResult<Command> {
    let mut pairs = CommandParser::parse(Rule::command, input.trim())?;
    let statement = pairs
        .next()
        .and_then(|command| command.into_inner().next())
        .ok_or_else(|| semantic("empty command"))?;

    match statement.as_rule() {
        Rule::create_node_stmt => parse_create_node(statement),
        Rule::create_rel_stmt => parse_create_relationship(statement),
        Rule::get_node_stmt => Ok(Command::GetNode(parse_node_ref(statement)?)),
        Rule::get_neighbors_stmt => parse_get_neighbors(statement),
        Rule::update_node_stmt => parse_update_node(statement),
        Rule::delete_node_stmt => Ok(Command::DeleteNode(parse_node_ref(statement)?)),
        Rule::update_rel_stmt => parse_update_relationship(statement),
        Rule::delete_rel_stmt => parse_delete_relationship(statement),
        Rule::traverse_stmt => parse_traverse(statement),
        Rule::match_stmt => parse_match(statement),
        Rule::export_stmt => Ok(Command::Export(parse_file_path(statement)?)),
        Rule::import_stmt => Ok(Command::Import(parse_file_path(statement)?)),
        rule => Err(semantic(format!("unrecognized command: {:?}", rule))),
    }
}

/// Parse a standalone condition such as `Person.age < 35 AND Company.name = "Acme"`
pub fn parse_condition(input: &str) -> ParseResult<Condition> {
    let mut pairs = CommandParser::parse(Rule::condition_input, input.trim())?;
    let input = pairs.next().ok_or_else(|| semantic("empty condition"))?;

    input
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::condition)
        .map(parse_condition_expr)
        .unwrap_or_else(|| Err(semantic("empty condition")))
}

impl Condition {
    /// Parse condition text; malformed input is a [`ParseError`]
    pub fn parse(input: &str) -> ParseResult<Condition> {
        parse_condition(input)
    }
}

// ============================================================
// Statements
// ============================================================

fn parse_create_node(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut label = None;
    let mut properties = PropertyMap::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label => label = Some(Label::new(inner.as_str())),
            Rule::properties => properties = parse_properties(inner)?,
            _ => {}
        }
    }

    Ok(Command::CreateNode {
        label: required(label, "node label")?,
        properties,
    })
}

/// Shared by CREATE RELATIONSHIP and UPDATE RELATIONSHIP
fn parse_relationship_parts(
    pair: Pair<Rule>,
) -> ParseResult<(EdgeType, NodeRef, NodeRef, PropertyMap)> {
    let mut edge_type = None;
    let mut endpoints = Vec::with_capacity(2);
    let mut properties = PropertyMap::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::rel_type => edge_type = Some(EdgeType::new(inner.as_str())),
            Rule::node_ref => endpoints.push(parse_node_ref(inner)?),
            Rule::properties => properties = parse_properties(inner)?,
            _ => {}
        }
    }

    let mut endpoints = endpoints.into_iter();
    let from = required(endpoints.next(), "FROM node")?;
    let to = required(endpoints.next(), "TO node")?;
    Ok((required(edge_type, "relationship type")?, from, to, properties))
}

fn parse_create_relationship(pair: Pair<Rule>) -> ParseResult<Command> {
    let (edge_type, from, to, properties) = parse_relationship_parts(pair)?;
    Ok(Command::CreateRelationship {
        edge_type,
        from,
        to,
        properties,
    })
}

fn parse_update_relationship(pair: Pair<Rule>) -> ParseResult<Command> {
    let (edge_type, from, to, properties) = parse_relationship_parts(pair)?;
    Ok(Command::UpdateRelationship {
        edge_type,
        from,
        to,
        properties,
    })
}

fn parse_get_neighbors(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut edge_type = None;
    let mut direction = Direction::Outgoing;
    let node = parse_node_ref(pair.clone())?;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::rel_type => edge_type = Some(EdgeType::new(inner.as_str())),
            Rule::direction => direction = parse_direction(inner.as_str())?,
            _ => {}
        }
    }

    Ok(Command::GetNeighbors {
        node,
        edge_type,
        direction,
    })
}

fn parse_update_node(pair: Pair<Rule>) -> ParseResult<Command> {
    let node = parse_node_ref(pair.clone())?;
    let properties = pair
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::properties)
        .map(parse_properties)
        .transpose()?
        .unwrap_or_default();

    Ok(Command::UpdateNode { node, properties })
}

fn parse_delete_relationship(pair: Pair<Rule>) -> ParseResult<Command> {
    let id = pair
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::edge_id)
        .map(|inner| parse_u64(inner.as_str()))
        .transpose()?;

    Ok(Command::DeleteRelationship(EdgeId::new(required(id, "relationship id")?)))
}

fn parse_traverse(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut start = None;
    let mut steps = Vec::new();
    let mut condition = Condition::True;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node_ref => start = Some(parse_node_ref(inner)?),
            Rule::traverse_step => steps.push(parse_traverse_step(inner)?),
            Rule::where_clause => condition = parse_where(inner)?,
            _ => {}
        }
    }

    Ok(Command::Traverse {
        start: required(start, "start node")?,
        steps,
        condition,
    })
}

fn parse_traverse_step(pair: Pair<Rule>) -> ParseResult<TraversalStep> {
    let mut edge_type = None;
    let mut direction = Direction::Outgoing;
    let mut label = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::out_arrow | Rule::in_arrow => {
                if inner.as_rule() == Rule::in_arrow {
                    direction = Direction::Incoming;
                }
                edge_type = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::rel_type)
                    .map(|p| EdgeType::new(p.as_str()));
            }
            Rule::label => label = Some(Label::new(inner.as_str())),
            _ => {}
        }
    }

    Ok(TraversalStep {
        edge_type: required(edge_type, "relationship type")?,
        direction,
        target_label: label,
    })
}

fn parse_match(pair: Pair<Rule>) -> ParseResult<Command> {
    let mut start = None;
    let mut segments = Vec::new();
    let mut condition = Condition::True;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node_pattern => start = Some(parse_node_pattern(inner)?),
            Rule::match_segment => segments.push(parse_match_segment(inner)?),
            Rule::where_clause => condition = parse_where(inner)?,
            _ => {}
        }
    }

    Ok(Command::Match {
        template: Template {
            start: required(start, "start node pattern")?,
            segments,
        },
        condition,
    })
}

fn parse_match_segment(pair: Pair<Rule>) -> ParseResult<(RelationshipPattern, NodePattern)> {
    let mut relationship = None;
    let mut node = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::out_edge => relationship = Some(parse_edge_pattern(inner, Direction::Outgoing)?),
            Rule::in_edge => relationship = Some(parse_edge_pattern(inner, Direction::Incoming)?),
            Rule::node_pattern => node = Some(parse_node_pattern(inner)?),
            _ => {}
        }
    }

    Ok((
        required(relationship, "relationship pattern")?,
        required(node, "node pattern")?,
    ))
}

fn parse_node_pattern(pair: Pair<Rule>) -> ParseResult<NodePattern> {
    let mut variable = None;
    let mut label = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::variable => variable = Some(inner.as_str().to_string()),
            Rule::label => label = Some(Label::new(inner.as_str())),
            _ => {}
        }
    }

    Ok(NodePattern {
        variable,
        label: required(label, "node label")?,
    })
}

fn parse_edge_pattern(pair: Pair<Rule>, direction: Direction) -> ParseResult<RelationshipPattern> {
    let mut variable = None;
    let mut edge_type = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::variable => variable = Some(inner.as_str().to_string()),
            Rule::rel_type => edge_type = Some(EdgeType::new(inner.as_str())),
            _ => {}
        }
    }

    Ok(RelationshipPattern {
        variable,
        edge_type: required(edge_type, "relationship type")?,
        direction,
    })
}

fn parse_file_path(pair: Pair<Rule>) -> ParseResult<PathBuf> {
    let path = pair
        .into_inner()
        .find(|inner| inner.as_rule() == Rule::file_path)
        .and_then(|inner| inner.into_inner().next())
        .ok_or_else(|| semantic("missing file path"))?;

    match path.as_rule() {
        Rule::string => Ok(PathBuf::from(parse_string(path)?)),
        _ => Ok(PathBuf::from(path.as_str())),
    }
}

// ============================================================
// Shared pieces
// ============================================================

/// `Person(id=1)` inside a statement, or the `label node_id` pair of GET/UPDATE/DELETE NODE
fn parse_node_ref(pair: Pair<Rule>) -> ParseResult<NodeRef> {
    let mut label = None;
    let mut id = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label if label.is_none() => label = Some(Label::new(inner.as_str())),
            Rule::node_id if id.is_none() => id = Some(NodeId::new(parse_u64(inner.as_str())?)),
            _ => {}
        }
    }

    Ok(NodeRef {
        label: required(label, "node label")?,
        id: required(id, "node id")?,
    })
}

fn parse_direction(text: &str) -> ParseResult<Direction> {
    match text.to_ascii_uppercase().as_str() {
        "OUTGOING" => Ok(Direction::Outgoing),
        "INCOMING" => Ok(Direction::Incoming),
        "BOTH" => Ok(Direction::Both),
        other => Err(semantic(format!("unknown direction '{}'", other))),
    }
}

fn parse_where(pair: Pair<Rule>) -> ParseResult<Condition> {
    pair.into_inner()
        .find(|inner| inner.as_rule() == Rule::condition)
        .map(parse_condition_expr)
        .unwrap_or_else(|| Err(semantic("empty WHERE clause")))
}

fn parse_condition_expr(pair: Pair<Rule>) -> ParseResult<Condition> {
    PRATT_PARSER
        .map_primary(|primary| match primary.as_rule() {
            Rule::comparison => parse_comparison(primary),
            Rule::condition => parse_condition_expr(primary),
            rule => Err(semantic(format!("unexpected condition term: {:?}", rule))),
        })
        .map_infix(|left, op, right| {
            let left = left?;
            let right = right?;
            match op.as_rule() {
                Rule::and_op => Ok(left.and(right)),
                Rule::or_op => Ok(left.or(right)),
                rule => Err(semantic(format!("unexpected operator: {:?}", rule))),
            }
        })
        .parse(pair.into_inner())
}

fn parse_comparison(pair: Pair<Rule>) -> ParseResult<Condition> {
    let mut variable = None;
    let mut property = None;
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::property_ref => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::variable => variable = Some(part.as_str().to_string()),
                        Rule::property_key => property = Some(part.as_str().to_string()),
                        _ => {}
                    }
                }
            }
            Rule::compare_op => op = Some(parse_compare_op(inner.as_str())?),
            Rule::value => value = Some(parse_value(inner)?),
            _ => {}
        }
    }

    Ok(Condition::Comparison {
        variable: required(variable, "variable")?,
        property: required(property, "property")?,
        op: required(op, "comparison operator")?,
        value: required(value, "literal")?,
    })
}

fn parse_compare_op(text: &str) -> ParseResult<CompareOp> {
    match text {
        "<" => Ok(CompareOp::Lt),
        "<=" => Ok(CompareOp::Le),
        ">" => Ok(CompareOp::Gt),
        ">=" => Ok(CompareOp::Ge),
        "=" | "==" => Ok(CompareOp::Eq),
        "!=" | "<>" => Ok(CompareOp::Ne),
        other => Err(semantic(format!("unknown operator '{}'", other))),
    }
}

fn parse_properties(pair: Pair<Rule>) -> ParseResult<PropertyMap> {
    let mut props = PropertyMap::new();

    for prop in pair.into_inner() {
        if prop.as_rule() != Rule::property {
            continue;
        }

        let mut key = None;
        let mut value = None;
        for part in prop.into_inner() {
            match part.as_rule() {
                Rule::property_key => key = Some(part.as_str().to_string()),
                Rule::string => key = Some(parse_string(part)?),
                Rule::value => value = Some(parse_value(part)?),
                _ => {}
            }
        }

        let key = required(key, "property key")?;
        if props.contains_key(&key) {
            return Err(semantic(format!("duplicate property key '{}'", key)));
        }
        props.insert(key, required(value, "property value")?);
    }

    Ok(props)
}

fn parse_value(pair: Pair<Rule>) -> ParseResult<PropertyValue> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| semantic("missing value"))?;

    match inner.as_rule() {
        Rule::string => Ok(PropertyValue::String(parse_string(inner)?)),
        Rule::integer => inner
            .as_str()
            .parse::<i64>()
            .map(PropertyValue::Integer)
            .map_err(|e| semantic(format!("invalid integer '{}': {}", inner.as_str(), e))),
        Rule::float => inner
            .as_str()
            .parse::<f64>()
            .map(PropertyValue::Float)
            .map_err(|e| semantic(format!("invalid float '{}': {}", inner.as_str(), e))),
        Rule::boolean => Ok(PropertyValue::Boolean(inner.as_str().eq_ignore_ascii_case("true"))),
        Rule::array => inner
            .into_inner()
            .filter(|item| item.as_rule() == Rule::value)
            .map(parse_value)
            .collect::<ParseResult<Vec<_>>>()
            .map(PropertyValue::Array),
        rule => Err(semantic(format!("unexpected value: {:?}", rule))),
    }
}

/// Unquote a string literal, resolving backslash escapes
fn parse_string(pair: Pair<Rule>) -> ParseResult<String> {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => return Err(semantic("dangling escape in string literal")),
        }
    }
    Ok(out)
}

fn parse_u64(text: &str) -> ParseResult<u64> {
    text.parse::<u64>()
        .map_err(|e| semantic(format!("invalid id '{}': {}", text, e)))
}

fn required<T>(value: Option<T>, what: &str) -> ParseResult<T> {
    value.ok_or_else(|| semantic(format!("missing {}", what)))
}
