//! Solve a sudoku puzzle by treating each cell as an identifier to pin: a
//! `Candidate` is "cell (row, column) holds value", and pinning one cell
//! contributes `Exclude` requirements against every peer cell in the same
//! row, column, and 3x3 box -- exactly the all-different constraint
//! sudoku needs, expressed with nothing but `Provider::get_dependencies`.

use resolver_core::provider::{IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
use resolver_core::{Identified, IterableView, Resolution, ResolutionOptions};

type Cell = (u8, u8);

#[derive(Debug, Clone, Copy)]
enum Requirement {
    /// A clue from the puzzle itself: this cell must hold this value.
    Clue { row: u8, col: u8, value: u8 },
    /// A peer cell was pinned to `invalid`; this cell must not match it.
    Exclude { row: u8, col: u8, invalid: u8 },
}

impl Requirement {
    fn cell(&self) -> Cell {
        match *self {
            Requirement::Clue { row, col, .. } => (row, col),
            Requirement::Exclude { row, col, .. } => (row, col),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    row: u8,
    col: u8,
    value: u8,
}

struct SudokuProvider;

impl Provider<Cell, Requirement, Candidate> for SudokuProvider {
    type Preference = u8;

    fn identify(&self, item: Identified<'_, Requirement, Candidate>) -> Cell {
        match item {
            Identified::Requirement(r) => r.cell(),
            Identified::Candidate(c) => (c.row, c.col),
        }
    }

    fn get_preference(&self, identifier: &Cell, context: PreferenceContext<'_, Cell, Requirement, Candidate>) -> u8 {
        // Clue cells are already pinned to a single candidate; work on
        // them first so the engine burns through the forced moves before
        // guessing at anything.
        let is_clue = context
            .information(identifier)
            .any(|info| matches!(info.requirement, Requirement::Clue { .. }));
        if is_clue {
            0
        } else {
            1
        }
    }

    fn find_matches(
        &self,
        identifier: &Cell,
        requirements: RequirementsView<'_, Cell, Requirement, Candidate>,
        incompatibilities: IncompatibilitiesView<'_, Cell, Requirement, Candidate>,
    ) -> IterableView<Candidate> {
        let (row, col) = *identifier;
        let mut invalid = [false; 10];

        for requirement in requirements.requirements_for(identifier) {
            match requirement {
                Requirement::Clue { value, .. } => {
                    return IterableView::from_candidates(vec![Candidate { row, col, value: *value }]);
                }
                Requirement::Exclude { invalid: v, .. } => invalid[*v as usize] = true,
            }
        }
        for candidate in incompatibilities.incompatibilities_for(identifier) {
            invalid[candidate.value as usize] = true;
        }

        let candidates = (1..=9u8)
            .filter(|v| !invalid[*v as usize])
            .map(|value| Candidate { row, col, value })
            .collect::<Vec<_>>();
        IterableView::from_candidates(candidates)
    }

    fn is_satisfied_by(&self, requirement: &Requirement, candidate: &Candidate) -> bool {
        match *requirement {
            Requirement::Clue { value, .. } => candidate.value == value,
            Requirement::Exclude { invalid, .. } => candidate.value != invalid,
        }
    }

    fn get_dependencies(&self, candidate: &Candidate) -> Vec<Requirement> {
        let Candidate { row, col, value } = *candidate;
        let mut deps = Vec::with_capacity(20);

        for r in 0..9 {
            if r != row {
                deps.push(Requirement::Exclude { row: r, col, invalid: value });
            }
        }
        for c in 0..9 {
            if c != col {
                deps.push(Requirement::Exclude { row, col: c, invalid: value });
            }
        }
        let box_row = row - row % 3;
        let box_col = col - col % 3;
        for r in box_row..box_row + 3 {
            for c in box_col..box_col + 3 {
                if r != row && c != col {
                    deps.push(Requirement::Exclude { row: r, col: c, invalid: value });
                }
            }
        }
        deps
    }
}

fn main() {
    #[rustfmt::skip]
    let clues: [[u8; 9]; 9] = [
        [5, 3, 0, 0, 7, 0, 0, 0, 0],
        [6, 0, 0, 1, 9, 5, 0, 0, 0],
        [0, 9, 8, 0, 0, 0, 0, 6, 0],
        [8, 0, 0, 0, 6, 0, 0, 0, 3],
        [4, 0, 0, 8, 0, 3, 0, 0, 1],
        [7, 0, 0, 0, 2, 0, 0, 0, 6],
        [0, 6, 0, 0, 0, 0, 2, 8, 0],
        [0, 0, 0, 4, 1, 9, 0, 0, 5],
        [0, 0, 0, 0, 8, 0, 0, 7, 9],
    ];

    println!("Clues:");
    for row in &clues {
        println!("{}", row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "));
    }

    let root_requirements: Vec<Requirement> = (0..9u8)
        .flat_map(|row| (0..9u8).map(move |col| (row, col)))
        .filter_map(|(row, col)| {
            let value = clues[row as usize][col as usize];
            (value != 0).then_some(Requirement::Clue { row, col, value })
        })
        .collect();

    let resolution = Resolution::new(SudokuProvider);
    let result = resolution
        .resolve(root_requirements, ResolutionOptions::new().max_rounds(2000))
        .expect("this puzzle has a unique solution");

    println!("\nSolution:");
    for row in 0..9u8 {
        let line: Vec<String> = (0..9u8)
            .map(|col| result.mapping.get(&(row, col)).unwrap().value.to_string())
            .collect();
        println!("{}", line.join(" "));
    }
}
