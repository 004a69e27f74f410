//! Terminal and JSON rendering of command results.

use manidx_core::{
  catalog::{AproposHit, Coordinate, Manpage},
  lookup::Resolution,
};
use serde::Serialize;

#[derive(Serialize)]
struct LookupView<'a> {
  matched: &'a Coordinate,
  via:     &'a [Coordinate],
  manpage: &'a Manpage,
}

pub fn lookup_json(found: &Resolution) -> serde_json::Result<String> {
  serde_json::to_string_pretty(&LookupView {
    matched: &found.matched,
    via:     &found.resolved.via,
    manpage: &found.resolved.manpage,
  })
}

/// `path`, followed by the aliases traversed to reach it.
pub fn lookup_text(found: &Resolution) -> String {
  let manpage = &found.resolved.manpage;
  let mut out = manpage.path.clone();
  for hop in &found.resolved.via {
    out.push_str(&format!("\n  via {hop}"));
  }
  if !found.resolved.via.is_empty() {
    out.push_str(&format!("\n  -> {}", manpage.coordinate()));
  }
  out
}

pub fn apropos_json(hits: &[AproposHit]) -> serde_json::Result<String> {
  serde_json::to_string_pretty(hits)
}

/// One `name (section) - description` line per hit, in the style of
/// apropos(1), with the release and locale in brackets.
pub fn apropos_text(hits: &[AproposHit]) -> String {
  let entries: Vec<(String, &str)> = hits
    .iter()
    .map(|hit| {
      let page = &hit.manpage;
      let mut head = format!("{} ({}) [{}", page.name, page.section, page.release);
      if let Some(locale) = &page.locale {
        head.push_str(&format!(" {locale}"));
      }
      head.push(']');
      (head, page.description.as_deref().unwrap_or("(no description)"))
    })
    .collect();

  let width = entries.iter().map(|(head, _)| head.chars().count()).max().unwrap_or(0);
  entries
    .iter()
    .map(|(head, description)| format!("{head:<width$} - {description}"))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use manidx_core::{alias::Resolved, catalog::Section};

  use super::*;

  fn manpage(name: &str, section: &str, locale: Option<&str>, description: Option<&str>) -> Manpage {
    Manpage {
      release:     "22.04".into(),
      section:     Section::from(section),
      package:     "coreutils".into(),
      name:        name.into(),
      locale:      locale.map(str::to_owned),
      path:        format!("man{section}/{name}.{section}.gz"),
      version:     "8.32".into(),
      description: description.map(str::to_owned),
    }
  }

  #[test]
  fn apropos_lines_are_aligned() {
    let hits = [
      AproposHit {
        manpage: manpage("ls", "1", None, Some("list directory contents")),
        score:   2.0,
      },
      AproposHit {
        manpage: manpage("opendir", "3", Some("fr"), None),
        score:   1.0,
      },
    ];

    assert_eq!(
      apropos_text(&hits),
      "ls (1) [22.04]         - list directory contents\n\
       opendir (3) [22.04 fr] - (no description)"
    );
  }

  #[test]
  fn lookup_text_lists_the_chain() {
    let ls = manpage("ls", "1", None, None);
    let dir = Coordinate::new("22.04", "1", "dir", None);
    let found = Resolution {
      matched:  dir.clone(),
      resolved: Resolved { manpage: ls, via: vec![dir] },
    };

    let text = lookup_text(&found);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("man1/ls.1.gz"));
    assert!(lines.next().is_some_and(|line| line.starts_with("  via dir(1)")));
    assert!(lines.next().is_some_and(|line| line.starts_with("  -> ls(1)")));
  }
}
