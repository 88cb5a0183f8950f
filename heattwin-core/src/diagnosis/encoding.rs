//! Clause encoding of the dependency graph

use std::collections::HashMap;
use std::fmt;

use crate::diagnosis::graph::DependencyGraph;
use crate::diagnosis::sat::{Lit, Solver, Var};
use crate::diagnosis::Diagnosis;

/// A named proposition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    /// `AB(x)`: component `x` is in abnormal mode
    Abnormal(String),
    /// `output_ok(x)`: component `x` currently produces a correct output
    OutputOk(String),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Abnormal(name) => write!(f, "AB({})", name),
            Atom::OutputOk(name) => write!(f, "output_ok({})", name),
        }
    }
}

/// Bidirectional atom ↔ variable mapping; variables are numbered from 1 in
/// order of first use
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    atoms: Vec<Atom>,
    index: HashMap<Atom, Var>,
}

impl VariableMap {
    /// Variable for `atom`, allocating one on first use
    pub fn var(&mut self, atom: Atom) -> Var {
        if let Some(&var) = self.index.get(&atom) {
            return var;
        }
        self.atoms.push(atom.clone());
        let var = self.atoms.len() as Var;
        self.index.insert(atom, var);
        var
    }

    /// Variable already allocated for `atom`
    pub fn get(&self, atom: &Atom) -> Option<Var> {
        self.index.get(atom).copied()
    }

    /// Atom behind a variable
    pub fn atom(&self, var: Var) -> Option<&Atom> {
        self.atoms.get((var as usize).checked_sub(1)?)
    }

    /// `(var, atom)` pairs in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (Var, &Atom)> {
        self.atoms.iter().enumerate().map(|(i, atom)| (i as Var + 1, atom))
    }

    /// Number of allocated variables
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// True before the first allocation
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// System description plus observations for one failing-sensor report
#[derive(Debug, Clone)]
pub struct SystemEncoding {
    vars: VariableMap,
    system: Vec<Vec<Lit>>,
    observations: Vec<Vec<Lit>>,
    components: Vec<(String, Var)>,
}

impl SystemEncoding {
    /// Encode `graph` with `failing` look-ahead sensor nodes observed not OK
    pub fn encode<S: AsRef<str>>(graph: &DependencyGraph, failing: &[S]) -> Self {
        let mut vars = VariableMap::default();

        let system = graph
            .nodes()
            .map(|(node, inputs)| {
                let mut clause = vec![
                    Lit::positive(vars.var(Atom::OutputOk(node.to_string()))),
                    Lit::positive(vars.var(Atom::Abnormal(node.to_string()))),
                ];
                for input in inputs {
                    let lit = if graph.is_node(input) {
                        Lit::negative(vars.var(Atom::OutputOk(input.clone())))
                    } else {
                        Lit::positive(vars.var(Atom::Abnormal(input.clone())))
                    };
                    clause.push(lit);
                }
                clause
            })
            .collect();

        let observations = failing
            .iter()
            .map(|sensor| vec![Lit::negative(vars.var(Atom::OutputOk(sensor.as_ref().to_string())))])
            .collect();

        let components = graph
            .components()
            .iter()
            .map(|name| (name.clone(), vars.var(Atom::Abnormal(name.clone()))))
            .collect();

        Self {
            vars,
            system,
            observations,
            components,
        }
    }

    /// Variable map
    pub fn vars(&self) -> &VariableMap {
        &self.vars
    }

    /// One clause per graph node
    pub fn system(&self) -> &[Vec<Lit>] {
        &self.system
    }

    /// One unit clause per failing sensor
    pub fn observations(&self) -> &[Vec<Lit>] {
        &self.observations
    }

    /// Components covered by a mode assignment, in search order
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    /// Number of components
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Test a complete mode assignment: components in `abnormal` are forced
    /// `AB`, every other component is forced normal
    pub fn is_consistent(&self, abnormal: &Diagnosis) -> bool {
        let mut solver = Solver::new();
        for clause in self.system.iter().chain(&self.observations) {
            solver.add_clause(clause.iter().copied());
        }
        for (name, var) in &self.components {
            let lit = if abnormal.contains(name) {
                Lit::positive(*var)
            } else {
                Lit::negative(*var)
            };
            solver.add_clause([lit]);
        }
        solver.solve()
    }

    /// Symbolic form of a literal, e.g. `-output_ok(TA+1)`
    pub fn render(&self, lit: Lit) -> String {
        let name = match self.vars.atom(lit.var()) {
            Some(atom) => atom.to_string(),
            None => format!("#{}", lit.var()),
        };
        if lit.is_negated() {
            format!("-{}", name)
        } else {
            name
        }
    }

    fn render_clause(&self, clause: &[Lit]) -> String {
        let literals: Vec<String> = clause.iter().map(|&lit| self.render(lit)).collect();
        format!("[{}]", literals.join(", "))
    }
}

impl fmt::Display for SystemEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "variables:")?;
        for (var, atom) in self.vars.iter() {
            writeln!(f, "  {}: {}", atom, var)?;
        }
        writeln!(f, "system description:")?;
        for clause in &self.system {
            writeln!(f, "  {}", self.render_clause(clause))?;
        }
        writeln!(f, "observations:")?;
        for clause in &self.observations {
            writeln!(f, "  {}", self.render_clause(clause))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosis(names: &[&str]) -> Diagnosis {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clause_per_node() {
        let graph = DependencyGraph::canonical();
        let encoding = SystemEncoding::encode(&graph, &["TA+1"]);

        assert_eq!(encoding.system().len(), 10);
        assert_eq!(encoding.observations().len(), 1);
        assert_eq!(encoding.num_components(), 14);

        let rendered: Vec<String> = encoding.system().iter().map(|c| encoding.render_clause(c)).collect();
        assert!(rendered.contains(&"[output_ok(C1), AB(C1), AB(TA), AB(TB)]".to_string()));
        assert!(rendered.contains(&"[output_ok(H1), AB(H1), -output_ok(C1)]".to_string()));
        assert!(rendered.contains(&"[output_ok(TB+1), AB(TB+1), -output_ok(H1), -output_ok(H2)]".to_string()));
        assert_eq!(encoding.render_clause(&encoding.observations()[0]), "[-output_ok(TA+1)]");
    }

    #[test]
    fn variable_map_round_trip() {
        let mut vars = VariableMap::default();
        let a = vars.var(Atom::Abnormal("H1".into()));
        let b = vars.var(Atom::OutputOk("H1".into()));
        assert_eq!((a, b), (1, 2));
        assert_eq!(vars.var(Atom::Abnormal("H1".into())), 1);
        assert_eq!(vars.atom(2), Some(&Atom::OutputOk("H1".into())));
        assert_eq!(vars.atom(0), None);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn no_observation_means_nothing_is_wrong() {
        let encoding = SystemEncoding::encode::<&str>(&DependencyGraph::canonical(), &[]);
        assert!(encoding.is_consistent(&Diagnosis::new()));
    }

    #[test]
    fn failing_sensor_needs_an_abnormal_component() {
        let encoding = SystemEncoding::encode(&DependencyGraph::canonical(), &["TA+1"]);
        assert!(!encoding.is_consistent(&Diagnosis::new()));
        assert!(encoding.is_consistent(&diagnosis(&["TA+1"])));
        assert!(encoding.is_consistent(&diagnosis(&["H1"])));
        assert!(encoding.is_consistent(&diagnosis(&["TB"])));
        // H3 does not feed TA+1
        assert!(!encoding.is_consistent(&diagnosis(&["H3"])));
    }

    #[test]
    fn dump_lists_every_section() {
        let encoding = SystemEncoding::encode(&DependencyGraph::canonical(), &["TC+1"]);
        let dump = encoding.to_string();
        assert!(dump.contains("variables:"));
        assert!(dump.contains("system description:"));
        assert!(dump.contains("observations:\n  [-output_ok(TC+1)]"));
    }
}
