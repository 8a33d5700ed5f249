use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::problem::SearchHit;
use crate::selection::SelectedProblem;

const HELP: &str = "\
commands:
  search <query>      find problems by number or title
  add <id>            select a problem
  rm <id>             unselect a problem
  move <id> <row>     move a problem before the one at <row> (0-based)
  list                show the selection
  crawl               fetch every selected problem
  preview             print the assembled markdown
  generate [file]     write the notebook
  clear               reset everything
  quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Search(String),
    Add(u32),
    Remove(u32),
    Move(u32, u32),
    List,
    Crawl,
    Preview,
    Generate(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let id = |s: &str| s.parse::<u32>().map_err(|_| format!("not a problem number: {s:?}"));

        match name {
            "search" | "s" => Ok(Self::Search(rest.to_string())),
            "add" | "a" => Ok(Self::Add(id(rest)?)),
            "rm" | "remove" => Ok(Self::Remove(id(rest)?)),
            "move" | "mv" => {
                let (problem, row) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: move <id> <row>".to_string())?;
                let row = row
                    .trim()
                    .parse()
                    .map_err(|_| format!("not a row: {row:?}"))?;
                Ok(Self::Move(id(problem)?, row))
            }
            "list" | "ls" => Ok(Self::List),
            "crawl" => Ok(Self::Crawl),
            "preview" => Ok(Self::Preview),
            "generate" | "gen" => Ok(Self::Generate(
                Some(rest).filter(|r| !r.is_empty()).map(PathBuf::from),
            )),
            "clear" => Ok(Self::Clear),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command {other:?}, try `help`")),
        }
    }
}

pub struct Shell {
    controller: Controller,
    notebook_file: PathBuf,
    last_hits: Vec<SearchHit>,
}

impl Shell {
    pub fn new(controller: Controller, notebook_file: impl Into<PathBuf>) -> Self {
        Self {
            controller,
            notebook_file: notebook_file.into(),
            last_hits: vec![],
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            write(&mut writer, "> ").await?;
            let Some(line) = lines.next_line().await.map_err(|e| Error::io("<stdin>", e))? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let output = match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => match self.execute(command).await {
                    Ok(output) => output,
                    Err(e) => format!("error: {e}"),
                },
                Err(message) => message,
            };
            write(&mut writer, &output).await?;
            write(&mut writer, "\n").await?;
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Search(query) => {
                if !self.controller.search_input(&query) {
                    return Ok("empty query".into());
                }
                let Some(outcome) = self.controller.next_search().await else {
                    return Ok(String::new());
                };
                self.last_hits = outcome.hits?;
                if self.last_hits.is_empty() {
                    return Ok(format!("no results for {:?}", outcome.query));
                }
                Ok(self
                    .last_hits
                    .iter()
                    .map(|hit| format!("{} {} [{}]", hit.id, hit.title, hit.tier.name))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Add(id) => {
                let problem = self
                    .last_hits
                    .iter()
                    .find(|hit| hit.id == id)
                    .cloned()
                    .map(SelectedProblem::from)
                    .unwrap_or_else(|| SelectedProblem::untitled(id));
                self.controller.add(problem)?;
                Ok(format!("added {id}"))
            }
            Command::Remove(id) => Ok(if self.controller.selection_mut().remove(id) {
                format!("removed {id}")
            } else {
                format!("{id} is not selected")
            }),
            Command::Move(id, row) => {
                let selection = self.controller.selection_mut();
                let rows = selection.rows();
                if selection.drop_at(id, row as f64, &rows) {
                    Ok(self.list())
                } else {
                    Ok(format!("{id} is not selected"))
                }
            }
            Command::List => Ok(self.list()),
            Command::Crawl => {
                let report = self.controller.crawl().await?;
                let mut output: Vec<String> = report
                    .skipped
                    .iter()
                    .map(|(id, e)| format!("skipped {id}: {e}"))
                    .collect();
                output.push(self.controller.status().to_string());
                Ok(output.join("\n"))
            }
            Command::Preview => self
                .controller
                .markdown()
                .map(String::from)
                .ok_or(Error::NothingToGenerate),
            Command::Generate(path) => {
                let path = path.unwrap_or_else(|| self.notebook_file.clone());
                self.controller.generate()?.write_to(&path)?;
                Ok(format!("wrote {}", path.display()))
            }
            Command::Clear => {
                self.controller.clear();
                self.last_hits.clear();
                Ok("cleared".into())
            }
            Command::Help => Ok(HELP.into()),
            Command::Quit => Ok(String::new()),
        }
    }

    fn list(&self) -> String {
        let selection = self.controller.selection();
        if selection.is_empty() {
            return "nothing selected".into();
        }
        selection
            .iter()
            .enumerate()
            .map(|(row, p)| match p.title.as_str() {
                "" => format!("{row}. {}", p.id),
                title => format!("{row}. {} - {title} [{}]", p.id, p.tier.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

async fn write<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    writer
        .write_all(text.as_bytes())
        .await
        .map_err(|e| Error::io("<stdout>", e))?;
    writer.flush().await.map_err(|e| Error::io("<stdout>", e))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Config;
    use crate::fetch::ProblemFetcher;
    use crate::notebook::Notebook;

    #[test]
    fn commands_should_parse() {
        assert_eq!(Command::parse("add 1000"), Ok(Command::Add(1000)));
        assert_eq!(Command::parse("  mv 1000   2 "), Ok(Command::Move(1000, 2)));
        assert_eq!(
            Command::parse("search a + b"),
            Ok(Command::Search("a + b".into()))
        );
        assert_eq!(Command::parse("generate"), Ok(Command::Generate(None)));
        assert_eq!(
            Command::parse("generate out.ipynb"),
            Ok(Command::Generate(Some("out.ipynb".into())))
        );
        assert!(Command::parse("add x").is_err());
        assert!(Command::parse("fly").is_err());
    }

    #[tokio::test]
    async fn shell_session_should_write_notebook() {
        let server = MockServer::start().await;
        let page = fs::read_to_string("fixtures/1000.html").unwrap();
        Mock::given(method("GET"))
            .and(path("/problem/1000"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/problem/show"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"level": 1}"#))
            .mount(&server)
            .await;

        let config = Config {
            archive_origin: server.uri(),
            metadata_origin: server.uri(),
            failure_delay_ms: 0,
            ..Default::default()
        };
        let controller = Controller::new(ProblemFetcher::from_config(&config).unwrap(), &config);
        let out = std::env::temp_dir().join(format!("boj-shell-{}.ipynb", std::process::id()));
        let mut shell = Shell::new(controller, &out);

        let input = "add 1000\nadd 1000\nlist\ncrawl\ngenerate\nquit\nadd 1001\n";
        let mut output = Vec::new();
        shell.run(input.as_bytes(), &mut output).await.unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("added 1000"));
        assert!(output.contains("error: problem 1000 is already selected"));
        assert!(output.contains("0. 1000"));
        assert!(output.contains("fetched 1 problem(s)"));
        assert!(output.contains(&format!("wrote {}", out.display())));
        assert_eq!(shell.controller().selection().ids(), [1000]);

        let notebook: Notebook = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        fs::remove_file(&out).unwrap();
        assert_eq!(notebook.cells.len(), 2);
    }
}
