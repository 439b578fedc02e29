use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use relalg::data_type::DataType;
use relalg::eval::{EvaluationContext, Evaluator};
use relalg::parser::Parser;
use relalg::printer;
use relalg::row::Row;
use relalg::schema::{Attribute, Schema};
use relalg::table::Table;
use relalg::tokenizer::Tokenizer;
use relalg::value::Value;

fn main() -> io::Result<()> {
    println!("relalg console. Type :help for commands; end each statement with ; or }}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut console = Console::new();

    'repl: loop {
        prompt("relalg> ")?;
        let Some(first) = lines.next().transpose()? else {
            break;
        };
        let mut buffer = first;

        // Accumulate until the statement is terminated by ';' or a relation
        // block's closing '}'.
        while !is_complete(&buffer) {
            prompt("      > ")?;
            let Some(next) = lines.next().transpose()? else {
                break;
            };
            buffer.push('\n');
            buffer.push_str(&next);
        }
        if buffer.trim().is_empty() {
            continue;
        }

        for statement in split_statements(&buffer) {
            let statement = statement.trim().trim_end_matches(';').trim();
            if statement.is_empty() {
                continue;
            }
            if console.execute(statement) == Outcome::Exit {
                break 'repl;
            }
        }
    }
    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{text}");
    io::stdout().flush()
}

fn is_complete(buffer: &str) -> bool {
    let trimmed = buffer.trim_end();
    trimmed.ends_with(';') || trimmed.ends_with('}')
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Continue,
    Exit,
}

/// The interactive session: a named catalog of relations plus the dispatch
/// over commands, relation definitions, and queries.
struct Console {
    catalog: BTreeMap<String, Table>,
}

impl Console {
    fn new() -> Self {
        Self {
            catalog: BTreeMap::new(),
        }
    }

    fn execute(&mut self, statement: &str) -> Outcome {
        let lower = statement.to_lowercase();
        match lower.as_str() {
            "exit" | ":exit" | "quit" | ":quit" => {
                println!("bye");
                return Outcome::Exit;
            }
            "help" | ":help" | "?" => {
                print_help();
                return Outcome::Continue;
            }
            "tables" | ":tables" => {
                self.list_tables();
                return Outcome::Continue;
            }
            _ => {}
        }

        if lower.starts_with(":show") || lower.starts_with("show") {
            match statement.split_once(' ') {
                Some((_, name)) if !name.trim().is_empty() => self.show(name.trim()),
                _ => println!("Usage: :show <RelationName>"),
            }
            return Outcome::Continue;
        }

        if looks_like_relation_header(statement) {
            match self.define_relation(statement) {
                Ok(()) => {}
                Err(message) => println!("! {message}"),
            }
            return Outcome::Continue;
        }

        match self.run_query(statement) {
            Ok(table) => println!("{}", printer::render(&table)),
            Err(e) => println!("! {e}"),
        }
        Outcome::Continue
    }

    fn run_query(&self, query: &str) -> relalg::Result<Table> {
        let ctx = EvaluationContext::new(self.catalog.clone().into_iter().collect());
        let tokens = Tokenizer::new(query).tokenize()?;
        let ast = Parser::new(tokens).parse()?;
        Evaluator::new(&ctx).eval(&ast)
    }

    fn show(&self, name: &str) {
        match self.catalog.get(name) {
            Some(table) => println!("{}", printer::render(table)),
            None => println!("Relation \"{name}\" does not exist."),
        }
    }

    fn list_tables(&self) {
        if self.catalog.is_empty() {
            println!("(no tables)");
            return;
        }
        for (name, table) in &self.catalog {
            println!("- {name} :: {}", table.schema());
        }
    }

    /// Installs a relation literal of the form `Name (A, B) = { rows }`.
    ///
    /// Each attribute's type is inferred from the first row; later rows are
    /// coerced to it. An empty body yields an empty all-text relation.
    fn define_relation(&mut self, statement: &str) -> Result<(), String> {
        let (name, attrs, body) = parse_relation_literal(statement)?;

        let row_lines: Vec<&str> = body
            .split(['\n', ';'])
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        if row_lines.is_empty() {
            let schema = text_schema(&attrs)?;
            let table = Table::new(schema);
            println!("created empty {name} :: {}", table.schema());
            self.catalog.insert(name, table);
            return Ok(());
        }

        let first = parse_cells(row_lines[0], attrs.len())?;
        let attributes = attrs
            .iter()
            .zip(&first)
            .map(|(attr, cell)| {
                Attribute::new(attr.clone(), infer_type(cell)).map_err(|e| e.to_string())
            })
            .collect::<Result<Vec<_>, String>>()?;
        let schema = Schema::new(attributes).map_err(|e| e.to_string())?;
        let mut table = Table::new(schema);

        for line in &row_lines {
            let cells = parse_cells(line, attrs.len())?;
            let row = build_row(table.schema(), &cells)?;
            table.insert(row).map_err(|e| e.to_string())?;
        }

        println!("loaded relation: {name} :: {}", table.schema());
        println!("{}", printer::render(&table));
        self.catalog.insert(name, table);
        Ok(())
    }
}

fn looks_like_relation_header(statement: &str) -> bool {
    ["(", ")", "=", "{"].iter().all(|s| statement.contains(s))
}

/// Splits `Name (A, B) = { body }` into its three parts, requiring the
/// delimiters in that order.
fn parse_relation_literal(statement: &str) -> Result<(String, Vec<String>, &str), String> {
    let open = statement.find('(');
    let close = statement.find(')');
    let eq = statement.find('=');
    let brace = statement.find('{');
    let (Some(open), Some(close), Some(eq), Some(brace)) = (open, close, eq, brace) else {
        return Err("bad relation header".to_string());
    };
    if open > close || close > eq || eq > brace {
        return Err("bad relation header".to_string());
    }
    let end = statement
        .rfind('}')
        .ok_or_else(|| "relation block missing closing '}'".to_string())?;
    if end < brace {
        return Err("relation block missing closing '}'".to_string());
    }

    let name = statement[..open].trim().to_string();
    if name.is_empty() {
        return Err("relation header has no name".to_string());
    }
    let attrs: Vec<String> = statement[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    if attrs.is_empty() {
        return Err("no attributes in header".to_string());
    }
    Ok((name, attrs, &statement[brace + 1..end]))
}

/// Splits a row line on commas outside double quotes. Quotes stay attached
/// to their cell so type inference can see them.
fn parse_cells(line: &str, arity: usize) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !cells.is_empty() {
        cells.push(current.trim().to_string());
    }
    if cells.len() != arity {
        return Err(format!("row arity mismatch: expected {arity} values"));
    }
    Ok(cells)
}

fn text_schema(attrs: &[String]) -> Result<Schema, String> {
    let attributes = attrs
        .iter()
        .map(|a| Attribute::new(a.clone(), DataType::Text).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, String>>()?;
    Schema::new(attributes).map_err(|e| e.to_string())
}

fn infer_type(cell: &str) -> DataType {
    if is_quoted(cell) {
        return DataType::Text;
    }
    if cell.parse::<i64>().is_ok() {
        return DataType::Int;
    }
    if cell.contains('.') && cell.parse::<f64>().is_ok() {
        return DataType::Double;
    }
    if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
        return DataType::Bool;
    }
    DataType::Text
}

fn is_quoted(cell: &str) -> bool {
    cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"')
}

fn coerce(cell: &str, kind: DataType) -> Result<Value, String> {
    let unquoted = if is_quoted(cell) {
        &cell[1..cell.len() - 1]
    } else {
        cell
    };
    match kind {
        DataType::Int => unquoted
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("expected an integer value: {cell}")),
        DataType::Double => unquoted
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| format!("expected a numeric value: {cell}")),
        DataType::Bool => {
            if unquoted.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if unquoted.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(format!("expected boolean value (true/false): {cell}"))
            }
        }
        DataType::Text => Ok(Value::Text(unquoted.into())),
    }
}

fn build_row(schema: &Schema, cells: &[String]) -> Result<Row, String> {
    let mut row = Row::new();
    for (attr, cell) in schema.attributes().iter().zip(cells) {
        row = row.with(attr.name.clone(), coerce(cell, attr.data_type)?);
    }
    Ok(row)
}

/// Splits input into ';'-terminated statements, ignoring semicolons inside
/// quotes or inside a `{ ... }` block.
fn split_statements(input: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut brace_depth = 0usize;

    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '{' => {
                    brace_depth += 1;
                    current.push(c);
                }
                '}' => {
                    brace_depth = brace_depth.saturating_sub(1);
                    current.push(c);
                }
                ';' if brace_depth == 0 => {
                    statements.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

fn print_help() {
    println!(
        "\
Define a relation:
  R (A, B, C) = {{
    a1, b1, c1
    a2, b2, c2
  }};

Operators (symbol or keyword form):
  Selection     σ Age > 30 (Employees);      select Age > 30 (Employees);
  Projection    π Name, Age (Employees);     project Name, Age (Employees);
  Rename        ρ Emp (Employees);           rename Emp (Employees);
  Join          Employees ⋈ EID = SID Takes; Employees join EID = SID Takes;
  Union         A ∪ B;                       A union B;
  Intersection  A ∩ B;                       A intersect B;
  Difference    A − B;                       A - B;

Combined:
  π Name (σ Age > 30 (Employees));

Commands:
  :tables   List loaded relations
  :show R   Print relation R
  :help     This menu
  :exit     Quit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements_outside_quotes_and_braces() {
        let split = split_statements(":tables; σ X = 'a;b' (R); A (X) = { 1; 2 };");
        assert_eq!(split.len(), 3);
        assert_eq!(split[0], ":tables");
        assert_eq!(split[1].trim(), "σ X = 'a;b' (R)");
        assert_eq!(split[2].trim(), "A (X) = { 1; 2 }");
    }

    #[test]
    fn test_split_keeps_trailing_naked_statement() {
        let split = split_statements("π Name (R)");
        assert_eq!(split, vec!["π Name (R)".to_string()]);
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type("42"), DataType::Int);
        assert_eq!(infer_type("-7"), DataType::Int);
        assert_eq!(infer_type("4.5"), DataType::Double);
        assert_eq!(infer_type("true"), DataType::Bool);
        assert_eq!(infer_type("FALSE"), DataType::Bool);
        assert_eq!(infer_type("hello"), DataType::Text);
        // quoted cells are always text, even when numeric
        assert_eq!(infer_type("\"123\""), DataType::Text);
    }

    #[test]
    fn test_parse_cells_respects_quotes() {
        let cells = parse_cells("\"Doe, John\", 32", 2).unwrap();
        assert_eq!(cells, vec!["\"Doe, John\"".to_string(), "32".to_string()]);
    }

    #[test]
    fn test_parse_cells_arity_mismatch() {
        assert!(parse_cells("1, 2, 3", 2).is_err());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("7", DataType::Int).unwrap(), Value::Int(7));
        assert_eq!(coerce("2.5", DataType::Double).unwrap(), Value::Double(2.5));
        assert_eq!(coerce("true", DataType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(
            coerce("\"hi\"", DataType::Text).unwrap(),
            Value::Text("hi".into())
        );
        assert!(coerce("seven", DataType::Int).is_err());
        assert!(coerce("yes", DataType::Bool).is_err());
    }

    #[test]
    fn test_relation_literal_round_trip() {
        let mut console = Console::new();
        let stmt = "Employees (EID, Name, Age) = { E1, John, 32\nE2, Alice, 28 }";
        console.define_relation(stmt).unwrap();

        let table = console.catalog.get("Employees").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.schema().to_string(),
            "(EID:Text, Name:Text, Age:Int)"
        );

        let out = console.run_query("σ Age > 30 (Employees)").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0].get("Name"), Some(&Value::Text("John".into())));
    }

    #[test]
    fn test_empty_relation_literal_is_all_text() {
        let mut console = Console::new();
        console.define_relation("R (A, B) = { }").unwrap();
        let table = console.catalog.get("R").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.schema().to_string(), "(A:Text, B:Text)");
    }

    #[test]
    fn test_bad_relation_header() {
        let mut console = Console::new();
        assert!(console.define_relation("(A) = { 1 }").is_err());
        assert!(console.define_relation("R () = { 1 }").is_err());
    }

    #[test]
    fn test_later_row_failing_coercion() {
        let mut console = Console::new();
        let err = console
            .define_relation("R (X) = { 1\ntwo }")
            .unwrap_err();
        assert!(err.contains("integer"));
    }
}
