use itertools::iproduct;
use rand::Rng;
use rand::prelude::IndexedRandom;
use std::collections::HashSet;

/// Represents a 2D coordinate on the minesweeper board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

/// A single logical statement about the board: exactly `count` of the cells
/// in `cells` are mines.
///
/// For example, a revealed '1' yields a sentence stating that exactly 1 mine
/// is among its hidden neighbors. Two sentences are equal when they cover the
/// same cells with the same count, regardless of construction order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sentence {
    /// The set of undetermined cells this statement applies to.
    cells: HashSet<Point>,
    /// The exact number of mines among `cells`.
    count: usize,
}

/// The outcome of a single bot turn, for reporting by the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A cell proven safe was revealed, with its neighbor mine count.
    Safe(Point, u8),
    /// No deduction was possible; a random cell was revealed and survived.
    Guess(Point, u8),
    /// A random guess hit a mine. The game is lost.
    Exploded(Point),
    /// No playable cell remains: every unplayed cell is a proven mine.
    Exhausted,
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

// --- Sentence Implementation (one atomic piece of knowledge) ---

impl Sentence {
    pub fn new(cells: HashSet<Point>, count: usize) -> Self {
        assert!(
            count <= cells.len(),
            "Sentence claims {} mines among {} cells.",
            count,
            cells.len()
        );
        Sentence { cells, count }
    }

    /// The cells provably mines from this sentence alone: all of them, when
    /// the count equals the size of the set. Empty otherwise.
    pub fn known_mines(&self) -> HashSet<Point> {
        if self.count == self.cells.len() {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// The cells provably safe from this sentence alone: all of them, when
    /// the count is zero. Empty otherwise.
    pub fn known_safes(&self) -> HashSet<Point> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// Accounts for `cell` being a mine: one fewer unknown cell, one fewer
    /// mine among the remainder. No-op if the cell is not covered.
    pub fn mark_mine(&mut self, cell: Point) {
        if self.cells.remove(&cell) {
            self.count = self
                .count
                .checked_sub(1)
                .expect("sentence count went negative");
        }
    }

    /// Accounts for `cell` being safe: it can never be one of the counted
    /// mines, so the count stands. No-op if the cell is not covered.
    pub fn mark_safe(&mut self, cell: Point) {
        self.cells.remove(&cell);
    }

    /// An empty sentence carries no information and can be discarded.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn is_subset_of(&self, other: &Sentence) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// The sentence left over once `other` (a subset of this one) is
    /// accounted for: its cells removed, its mines subtracted.
    fn difference(&self, other: &Sentence) -> Sentence {
        let cells = self.cells.difference(&other.cells).copied().collect();
        let count = self
            .count
            .checked_sub(other.count)
            .expect("subset sentence claims more mines than its superset");
        Sentence::new(cells, count)
    }
}

// --- KnowledgeAgent Implementation (the knowledge base and move policy) ---

/// Minesweeper player that accumulates logical sentences about the board and
/// derives which cells are certainly mines and which are certainly safe.
///
/// The agent never sees the board itself. It only learns through
/// `record_move_result`, which reports a revealed cell and the number of
/// mines among its neighbors.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeAgent {
    width: usize,
    height: usize,
    /// Cells already revealed by the agent. Only ever grows.
    moves_made: HashSet<Point>,
    /// Cells proven to be mines. Only ever grows.
    mines: HashSet<Point>,
    /// Cells proven to be safe. Only ever grows.
    safes: HashSet<Point>,
    /// Sentences currently believed true. Sentences are dropped once
    /// resolution empties them; no duplicates survive a closure pass.
    knowledge: Vec<Sentence>,
}

impl KnowledgeAgent {
    pub fn new(width: usize, height: usize) -> Self {
        KnowledgeAgent {
            width,
            height,
            moves_made: HashSet::new(),
            mines: HashSet::new(),
            safes: HashSet::new(),
            knowledge: Vec::new(),
        }
    }

    /// Cells proven to be mines so far.
    pub fn mines(&self) -> &HashSet<Point> {
        &self.mines
    }

    /// Cells proven to be safe so far.
    pub fn safes(&self) -> &HashSet<Point> {
        &self.safes
    }

    /// Cells already revealed.
    pub fn moves_made(&self) -> &HashSet<Point> {
        &self.moves_made
    }

    /// Ingests the result of revealing a safe cell: `count` mines among its
    /// neighbors.
    ///
    /// This function orchestrates the whole update for a single move:
    /// 1. Validates the report before touching any state.
    /// 2. Records the cell as played and safe, shrinking every sentence that
    ///    covered it.
    /// 3. Adds a new sentence over the cell's undetermined neighbors, with
    ///    already-proven mine neighbors subtracted from the count.
    /// 4. Runs inference to exhaustion, so `mines` and `safes` reflect
    ///    everything now derivable.
    pub fn record_move_result(&mut self, cell: Point, count: u8) -> anyhow::Result<()> {
        // --- 1. Validation (nothing is mutated until the report checks out) ---
        if cell.x >= self.width || cell.y >= self.height {
            anyhow::bail!("cell_out_of_bounds");
        }
        if self.mines.contains(&cell) {
            anyhow::bail!("cell_is_known_mine");
        }
        if self.moves_made.contains(&cell) {
            // Re-reporting a revealed cell adds nothing.
            return Ok(());
        }

        // Partition the neighborhood: proven mines reduce the count, proven
        // safes are excluded, the rest become the new sentence's cells.
        let mut cells = HashSet::new();
        let mut known_mine_neighbors = 0;
        let mut neighbor_count = 0;
        for neighbor in neighbors(self.width, self.height, cell) {
            neighbor_count += 1;
            if self.mines.contains(&neighbor) {
                known_mine_neighbors += 1;
            } else if !self.safes.contains(&neighbor) {
                cells.insert(neighbor);
            }
        }
        if count as usize > neighbor_count {
            anyhow::bail!("count_exceeds_neighbors");
        }
        let Some(remaining) = (count as usize).checked_sub(known_mine_neighbors) else {
            anyhow::bail!("count_below_known_mines");
        };
        if remaining > cells.len() {
            anyhow::bail!("count_exceeds_candidates");
        }

        // --- 2. The revealed cell is a made move, and safe by definition ---
        self.moves_made.insert(cell);
        self.mark_safe(cell);

        // --- 3. New knowledge about the neighborhood ---
        if !cells.is_empty() {
            let sentence = Sentence::new(cells, remaining);
            if !self.knowledge.contains(&sentence) {
                self.knowledge.push(sentence);
            }
        }

        // --- 4. Close over everything the new fact makes derivable ---
        self.infer();

        Ok(())
    }

    /// Records a proven mine and propagates the fact through every sentence.
    /// Returns whether the cell was newly marked.
    fn mark_mine(&mut self, cell: Point) -> bool {
        assert!(
            !self.safes.contains(&cell),
            "Cell ({}, {}) proven both mine and safe.",
            cell.x,
            cell.y
        );
        let newly_marked = self.mines.insert(cell);
        if newly_marked {
            for sentence in &mut self.knowledge {
                sentence.mark_mine(cell);
            }
        }
        newly_marked
    }

    /// Records a proven safe cell and propagates the fact through every
    /// sentence. Returns whether the cell was newly marked.
    fn mark_safe(&mut self, cell: Point) -> bool {
        assert!(
            !self.mines.contains(&cell),
            "Cell ({}, {}) proven both mine and safe.",
            cell.x,
            cell.y
        );
        let newly_marked = self.safes.insert(cell);
        if newly_marked {
            for sentence in &mut self.knowledge {
                sentence.mark_safe(cell);
            }
        }
        newly_marked
    }

    /// Applies every inference rule until a full pass derives nothing new.
    ///
    /// Each pass:
    /// a. Harvests the conclusions every sentence yields on its own and
    ///    propagates them, shrinking other sentences in turn.
    /// b. Compacts the knowledge base: resolved (empty) sentences carry no
    ///    information, and shrinking can collapse two sentences into
    ///    duplicates.
    /// c. Runs the subset rule over every sentence pair: if A's cells are a
    ///    subset of B's, the cells B covers beyond A hold exactly
    ///    B.count - A.count mines. A derived count of zero yields safes on
    ///    the next pass, a count matching the set size yields mines; this is
    ///    how deep deductions propagate without combinatorial search.
    fn infer(&mut self) {
        // Every productive pass resolves a cell or adds a novel sentence, so
        // the pass count is bounded for a finite board. Exceeding the ceiling
        // means the loop stopped making progress, which is a bug.
        let ceiling = self.width * self.height + self.knowledge.len() + 8;
        let mut passes = 0;
        loop {
            passes += 1;
            assert!(passes <= ceiling, "Inference failed to reach a fixpoint.");

            let mut changed = false;

            // --- a. Conclusions each sentence yields on its own ---
            let mut proven_mines: HashSet<Point> = HashSet::new();
            let mut proven_safes: HashSet<Point> = HashSet::new();
            for sentence in &self.knowledge {
                proven_mines.extend(sentence.known_mines());
                proven_safes.extend(sentence.known_safes());
            }
            for cell in proven_mines {
                changed |= self.mark_mine(cell);
            }
            for cell in proven_safes {
                changed |= self.mark_safe(cell);
            }

            // --- b. Compaction: drop resolved sentences and duplicates ---
            let mut compacted: Vec<Sentence> = Vec::with_capacity(self.knowledge.len());
            for sentence in self.knowledge.drain(..) {
                if !sentence.is_empty() && !compacted.contains(&sentence) {
                    compacted.push(sentence);
                }
            }
            self.knowledge = compacted;

            // --- c. Subset rule over every ordered pair ---
            let mut derived: Vec<Sentence> = Vec::new();
            for (i, a) in self.knowledge.iter().enumerate() {
                for (j, b) in self.knowledge.iter().enumerate() {
                    if i == j || !a.is_subset_of(b) {
                        continue;
                    }
                    let inferred = b.difference(a);
                    if !inferred.is_empty()
                        && !self.knowledge.contains(&inferred)
                        && !derived.contains(&inferred)
                    {
                        derived.push(inferred);
                    }
                }
            }
            if !derived.is_empty() {
                changed = true;
                self.knowledge.extend(derived);
            }

            if !changed {
                return;
            }
        }
    }

    /// A cell proven safe that has not been played yet, if any exists. The
    /// choice among several candidates is arbitrary.
    pub fn safe_move(&self) -> Option<Point> {
        self.safes.difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that has not been played and is not a proven
    /// mine, if any exists. The fallback for when `safe_move` comes up empty.
    pub fn random_move(&self, rng: &mut impl Rng) -> Option<Point> {
        let candidates: Vec<Point> = iproduct!(0..self.width, 0..self.height)
            .map(|(x, y)| Point { x, y })
            .filter(|point| !self.moves_made.contains(point) && !self.mines.contains(point))
            .collect();
        candidates.choose(rng).copied()
    }
}

// --- Game Implementation (ground truth the agent plays against) ---

/// The board itself: mine placement and ground-truth queries. The agent
/// never reads this directly; it only learns through reported counts.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Game {
    pub width: usize,
    pub height: usize,
    /// Where the mines actually are.
    mines: HashSet<Point>,
    /// Mines the player has identified and flagged.
    pub flagged: HashSet<Point>,
    /// Tracks the current status of the game (playing, won, lost).
    pub game_state: GameState,
}

impl Game {
    pub fn new(width: usize, height: usize, total_mines: usize, rng: &mut impl Rng) -> Self {
        if total_mines >= width * height {
            panic!("Total mines must be less than the number of cells on the board.");
        }
        let mut mines = HashSet::new();
        while mines.len() != total_mines {
            mines.insert(Point {
                x: rng.random_range(0..width),
                y: rng.random_range(0..height),
            });
        }
        Game {
            width,
            height,
            mines,
            flagged: HashSet::new(),
            game_state: GameState::Playing,
        }
    }

    pub fn is_mine(&self, at: Point) -> bool {
        self.mines.contains(&at)
    }

    pub fn total_mines(&self) -> usize {
        self.mines.len()
    }

    /// The number of mines within one row and column of `at`, the cell
    /// itself excluded.
    pub fn nearby_mines(&self, at: Point) -> u8 {
        neighbors(self.width, self.height, at)
            .filter(|neighbor| self.mines.contains(neighbor))
            .count() as u8
    }

    pub fn flag_mine(&mut self, at: Point) {
        self.flagged.insert(at);
    }

    /// The game is won once every mine has been flagged.
    pub fn won(&self) -> bool {
        self.flagged == self.mines
    }
}

/// All valid neighbor coordinates of a point, clipped to the board bounds.
/// It correctly handles board edges and corners.
pub fn neighbors(width: usize, height: usize, point: Point) -> impl Iterator<Item = Point> {
    // Define potential neighbor offsets (from -1 to 1 in both x and y)
    (-1..=1).flat_map(move |dy| {
        (-1..=1).filter_map(move |dx| {
            // Skip the center point itself (dx=0, dy=0)
            if dx == 0 && dy == 0 {
                return None;
            }

            let nx = point.x as isize + dx;
            let ny = point.y as isize + dy;

            // Check if the neighbor is within board bounds
            if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                Some(Point {
                    x: nx as usize,
                    y: ny as usize,
                })
            } else {
                None
            }
        })
    })
}

// --- Session Implementation (one autonomous playthrough) ---

/// A board plus the agent reasoning about it, serializable as one snapshot.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub game: Game,
    pub agent: KnowledgeAgent,
}

impl Session {
    pub fn new(width: usize, height: usize, total_mines: usize) -> Self {
        let mut rng = rand::rng();
        Session {
            game: Game::new(width, height, total_mines, &mut rng),
            agent: KnowledgeAgent::new(width, height),
        }
    }

    /// Deserializes a session snapshot from bytes.
    pub fn deserialize(bts: &Vec<u8>) -> Self {
        bcs::from_bytes(bts).unwrap()
    }

    /// Serializes the session snapshot to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        bcs::to_bytes(self).unwrap()
    }

    /// Plays one bot turn.
    ///
    /// 1. Prefer a cell the agent has proven safe.
    /// 2. Otherwise guess among the cells not yet played and not proven
    ///    mines. The guess may hit a mine and lose the game.
    /// 3. If no cell qualifies, the board is resolved: every unplayed cell
    ///    is a proven mine, so flag them all and the game is won.
    ///
    /// After a successful reveal the count is reported to the agent, every
    /// newly proven mine is flagged, and the win condition is rechecked.
    pub fn advance(&mut self) -> anyhow::Result<MoveOutcome> {
        if self.game.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }
        let mut rng = rand::rng();

        let (at, deduced) = match self.agent.safe_move() {
            Some(point) => (point, true),
            None => match self.agent.random_move(&mut rng) {
                Some(point) => (point, false),
                None => {
                    for mine in self.agent.mines().iter().copied() {
                        self.game.flag_mine(mine);
                    }
                    self.game.game_state = GameState::Won;
                    return Ok(MoveOutcome::Exhausted);
                }
            },
        };

        if self.game.is_mine(at) {
            self.game.game_state = GameState::Lost;
            return Ok(MoveOutcome::Exploded(at));
        }

        let count = self.game.nearby_mines(at);
        self.agent.record_move_result(at, count)?;

        // Flag everything the new knowledge proves.
        for mine in self.agent.mines().iter().copied() {
            self.game.flag_mine(mine);
        }
        if self.game.won() {
            self.game.game_state = GameState::Won;
        }

        Ok(if deduced {
            MoveOutcome::Safe(at, count)
        } else {
            MoveOutcome::Guess(at, count)
        })
    }
}
