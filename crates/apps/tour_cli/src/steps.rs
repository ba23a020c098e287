use std::fmt;
use std::str::FromStr;

/// One scripted interaction of `tour walk`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Step {
    Click { x: f64, y: f64 },
    Hover { x: f64, y: f64 },
    /// Drag by a pixel delta from the viewport centre.
    Look { dx: f64, dy: f64 },
    Back,
    Home,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = match s.split_once(':') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (s, None),
        };
        match (verb, rest) {
            ("back", None) => Ok(Step::Back),
            ("home", None) => Ok(Step::Home),
            ("click", Some(xy)) => pair(xy).map(|(x, y)| Step::Click { x, y }),
            ("hover", Some(xy)) => pair(xy).map(|(x, y)| Step::Hover { x, y }),
            ("look", Some(d)) => pair(d).map(|(dx, dy)| Step::Look { dx, dy }),
            _ => Err(format!(
                "invalid step {s:?}; expected click:X,Y | hover:X,Y | look:DX,DY | back | home"
            )),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Click { x, y } => write!(f, "click:{x},{y}"),
            Step::Hover { x, y } => write!(f, "hover:{x},{y}"),
            Step::Look { dx, dy } => write!(f, "look:{dx},{dy}"),
            Step::Back => f.write_str("back"),
            Step::Home => f.write_str("home"),
        }
    }
}

fn pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("invalid number {v:?}"))
    };
    Ok((parse(a)?, parse(b)?))
}

#[cfg(test)]
mod tests {
    use super::Step;

    #[test]
    fn parses_every_verb() {
        assert_eq!("click:640,360".parse(), Ok(Step::Click { x: 640.0, y: 360.0 }));
        assert_eq!("hover:1.5, 2".parse(), Ok(Step::Hover { x: 1.5, y: 2.0 }));
        assert_eq!("look:-100,0".parse(), Ok(Step::Look { dx: -100.0, dy: 0.0 }));
        assert_eq!("back".parse(), Ok(Step::Back));
        assert_eq!("home".parse(), Ok(Step::Home));
    }

    #[test]
    fn rejects_malformed_steps() {
        for bad in ["click", "click:1", "click:a,b", "back:1", "jump:1,2", "look:1,inf"] {
            assert!(bad.parse::<Step>().is_err(), "{bad}");
        }
    }
}
