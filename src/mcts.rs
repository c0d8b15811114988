use crate::board::{GameOutcome, Move};
use crate::game::GameState;
use crate::mcts_node::{Bound, MctsNode};
use crate::random::{RandomGenerator, SeededRandomGenerator};
use crate::search::monte_carlo::rollout;
use ego_tree::{NodeId, NodeRef, Tree};

pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Monte Carlo Tree Search over Ultimate Tic-Tac-Toe positions.
///
/// It holds the search tree, the random number generator, and the configuration for the search.
pub struct MonteCarloTreeSearch<R: RandomGenerator = SeededRandomGenerator> {
    tree: Tree<MctsNode>,
    random: R,
    exploration: f64,
    use_proven_bounds: bool,
    next_action: MctsAction,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<R: RandomGenerator> {
    state: GameState,
    random_generator: R,
    exploration: f64,
    use_proven_bounds: bool,
}

impl MonteCarloTreeSearchBuilder<SeededRandomGenerator> {
    /// Creates a new builder searching from `state`.
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            random_generator: SeededRandomGenerator::default(),
            exploration: DEFAULT_EXPLORATION,
            use_proven_bounds: true,
        }
    }
}

impl<R: RandomGenerator> MonteCarloTreeSearchBuilder<R> {
    /// Sets the random number generator used for expansion and rollouts.
    pub fn with_random_generator<G: RandomGenerator>(
        self,
        rg: G,
    ) -> MonteCarloTreeSearchBuilder<G> {
        MonteCarloTreeSearchBuilder {
            state: self.state,
            random_generator: rg,
            exploration: self.exploration,
            use_proven_bounds: self.use_proven_bounds,
        }
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Enables or disables propagation of proven wins and losses.
    pub fn with_proven_bounds(mut self, use_proven_bounds: bool) -> Self {
        self.use_proven_bounds = use_proven_bounds;
        self
    }

    pub fn build(self) -> MonteCarloTreeSearch<R> {
        MonteCarloTreeSearch::new(
            self.state,
            self.random_generator,
            self.exploration,
            self.use_proven_bounds,
        )
    }
}

impl MonteCarloTreeSearch {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(state: GameState) -> MonteCarloTreeSearchBuilder<SeededRandomGenerator> {
        MonteCarloTreeSearchBuilder::new(state)
    }
}

impl<R: RandomGenerator> MonteCarloTreeSearch<R> {
    pub fn new(state: GameState, rg: R, exploration: f64, use_proven_bounds: bool) -> Self {
        let tree = Tree::new(MctsNode::root(state));
        let root_id = tree.root().id();
        Self {
            tree,
            random: rg,
            exploration,
            use_proven_bounds,
            next_action: MctsAction::Selection {
                root: root_id,
                updated: vec![],
            },
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn tree(&self) -> &Tree<MctsNode> {
        &self.tree
    }

    pub fn root(&self) -> NodeRef<'_, MctsNode> {
        self.tree.root()
    }

    /// Returns the next MCTS action to be performed. Useful for debugging and visualization.
    pub fn next_action(&self) -> &MctsAction {
        &self.next_action
    }

    /// True once the value of the root is known and further iterations would change nothing.
    pub fn is_fully_calculated(&self) -> bool {
        matches!(self.next_action, MctsAction::EverythingIsCalculated)
    }

    fn node(&self, id: NodeId) -> NodeRef<'_, MctsNode> {
        self.tree
            .get(id)
            .expect("node ids are only handed out by this tree")
    }

    /// Executes a single step: Selection, Expansion, Simulation or Backpropagation.
    pub fn execute_action(&mut self) {
        match std::mem::replace(&mut self.next_action, MctsAction::EverythingIsCalculated) {
            MctsAction::Selection { root, .. } => {
                self.next_action = match self.select_next_node(root) {
                    None => MctsAction::EverythingIsCalculated,
                    Some(leaf) => MctsAction::Expansion { leaf },
                };
            }
            MctsAction::Expansion { leaf } => {
                let (children, selected) = self.expand_node(leaf);
                self.next_action = MctsAction::Simulation { selected, children };
            }
            MctsAction::Simulation { selected, .. } => {
                let result = self.simulate(selected);
                self.next_action = MctsAction::Backpropagation { selected, result };
            }
            MctsAction::Backpropagation { selected, result } => {
                let updated = self.backpropagate(selected, result);
                let root = self.tree.root();
                self.next_action = if root.value().is_fully_calculated {
                    MctsAction::EverythingIsCalculated
                } else {
                    MctsAction::Selection {
                        root: root.id(),
                        updated,
                    }
                };
            }
            MctsAction::EverythingIsCalculated => {}
        }
    }

    /// Performs one full iteration (Selection, Expansion, Simulation, Backpropagation).
    /// Returns the path of nodes updated during backpropagation, empty once the tree is
    /// fully calculated.
    pub fn do_iteration(&mut self) -> Vec<NodeId> {
        loop {
            self.execute_action();
            match &self.next_action {
                MctsAction::Selection { updated, .. } => return updated.clone(),
                MctsAction::EverythingIsCalculated => return vec![],
                _ => {}
            }
        }
    }

    /// Runs up to `n` iterations and returns how many were performed.
    pub fn iterate_n_times(&mut self, n: u32) -> u32 {
        let mut iteration = 0;
        while iteration < n && !self.is_fully_calculated() {
            self.do_iteration();
            iteration += 1;
        }
        iteration
    }

    /// The child of the root to play.
    ///
    /// A proven win is taken outright and proven losses are avoided while any alternative
    /// exists. Among the rest the highest score wins, the first child on ties.
    pub fn best_move(&self) -> Option<Move> {
        let root = self.tree.root();
        if let Some(win) = root
            .children()
            .find(|child| child.value().bound == Bound::ProvenWin)
        {
            return win.value().prev_move;
        }

        let all_lost = root
            .children()
            .all(|child| child.value().bound == Bound::ProvenLoss);
        let mut best: Option<(Move, f64)> = None;
        for child in root.children() {
            let node = child.value();
            if node.bound == Bound::ProvenLoss && !all_lost {
                continue;
            }
            let Some(mv) = node.prev_move else {
                continue;
            };
            let score = node.score();
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }
        best.map(|(mv, _)| mv)
    }

    /// Descends from `root` along the highest UCB1 children that are not fully calculated.
    fn select_next_node(&self, root: NodeId) -> Option<NodeId> {
        let mut current = self.node(root);
        if current.value().is_fully_calculated {
            return None;
        }

        while current.has_children() {
            let parent_visits = current.value().visits;
            let mut best: Option<(NodeRef<'_, MctsNode>, f64)> = None;
            for child in current.children() {
                if child.value().is_fully_calculated {
                    continue;
                }
                let ucb = self.ucb_value(parent_visits, child.value());
                if best.is_none_or(|(_, max_ucb)| ucb > max_ucb) {
                    best = Some((child, ucb));
                }
            }
            current = best?.0;
        }

        Some(current.id())
    }

    /// Creates one child per legal move of a leaf and picks one of them at random.
    /// Terminal leaves are returned as they are.
    fn expand_node(&mut self, leaf: NodeId) -> (Vec<NodeId>, NodeId) {
        let node = self.node(leaf).value();
        if node.outcome.is_over() {
            return (vec![], leaf);
        }
        debug_assert!(!self.node(leaf).has_children(), "expanding an expanded node");

        let state = node.state.clone();
        let height = node.height + 1;
        let mut leaf_mut = self
            .tree
            .get_mut(leaf)
            .expect("node ids are only handed out by this tree");
        let children: Vec<NodeId> = state
            .legal_moves()
            .iter()
            .map(|mv| leaf_mut.append(MctsNode::child(&state, *mv, height)).id())
            .collect();

        let selected = self.random.choose(&children[..]).copied().unwrap_or(leaf);
        (children, selected)
    }

    /// Plays a random game from the node and returns how it ended.
    fn simulate(&mut self, id: NodeId) -> GameOutcome {
        let state = self.node(id).value().state.clone();
        rollout(&state, &mut self.random)
    }

    /// Propagates a simulation result from `id` up to the root, updating statistics and bounds.
    fn backpropagate(&mut self, id: NodeId, outcome: GameOutcome) -> Vec<NodeId> {
        let mut branch = vec![id];
        let mut current = self.node(id);
        while let Some(parent) = current.parent() {
            branch.push(parent.id());
            current = parent;
        }

        for &node_id in &branch {
            let bound = self.bound_of(node_id);
            let is_fully_calculated = self.is_node_fully_calculated(node_id, bound);
            if let Some(mut node) = self.tree.get_mut(node_id) {
                let data = node.value();
                data.record(outcome);
                if is_fully_calculated {
                    data.is_fully_calculated = true;
                }
                if bound != Bound::None {
                    data.bound = bound;
                }
            }
        }

        branch
    }

    /// Determines the proven value of a node for its mover.
    fn bound_of(&self, id: NodeId) -> Bound {
        if !self.use_proven_bounds {
            return Bound::None;
        }

        let node = self.node(id);
        let data = node.value();
        if data.bound != Bound::None {
            return data.bound;
        }

        match data.outcome {
            GameOutcome::Won(winner) if winner == data.mover => return Bound::ProvenWin,
            GameOutcome::Won(_) => return Bound::ProvenLoss,
            GameOutcome::Drawn | GameOutcome::InProgress => {}
        }

        if !node.has_children() {
            return Bound::None;
        }

        // children are moves of the opponent
        if node
            .children()
            .any(|child| child.value().bound == Bound::ProvenWin)
        {
            return Bound::ProvenLoss;
        }
        if node
            .children()
            .all(|child| child.value().bound == Bound::ProvenLoss)
        {
            return Bound::ProvenWin;
        }

        Bound::None
    }

    /// Checks if a node can be considered fully calculated, meaning its outcome is certain.
    fn is_node_fully_calculated(&self, id: NodeId, bound: Bound) -> bool {
        if bound != Bound::None {
            return true;
        }

        let node = self.node(id);
        if node.value().outcome.is_over() {
            return true;
        }

        node.has_children()
            && node
                .children()
                .all(|child| child.value().is_fully_calculated)
    }

    /// UCB1 of `child` for the player choosing among the children of a node visited
    /// `parent_visits` times. Unvisited children come first.
    fn ucb_value(&self, parent_visits: u32, child: &MctsNode) -> f64 {
        if child.visits == 0 {
            f64::INFINITY
        } else {
            let visits = f64::from(child.visits);
            child.score() + self.exploration * (f64::from(parent_visits).ln() / visits).sqrt()
        }
    }
}

/// Represents the four main stages of the MCTS algorithm.
///
/// This enum is used to manage the state of the search process.
#[derive(Debug, PartialEq, Clone)]
pub enum MctsAction {
    /// Start from `root` and select successive children until a leaf is reached.
    Selection {
        root: NodeId,
        /// The path of nodes updated during the last backpropagation.
        updated: Vec<NodeId>,
    },
    /// Create the children of `leaf`.
    Expansion { leaf: NodeId },
    /// Run a random playout from `selected`, one of the freshly created `children`.
    Simulation {
        selected: NodeId,
        children: Vec<NodeId>,
    },
    /// Update the statistics of the nodes on the path from `selected` to the root.
    Backpropagation {
        selected: NodeId,
        result: GameOutcome,
    },
    /// The value of the root is certain.
    EverythingIsCalculated,
}

impl MctsAction {
    /// Returns the name of the current MCTS action.
    pub fn name(&self) -> &'static str {
        match self {
            MctsAction::Selection { .. } => "Selection",
            MctsAction::Expansion { .. } => "Expansion",
            MctsAction::Simulation { .. } => "Simulation",
            MctsAction::Backpropagation { .. } => "Backpropagation",
            MctsAction::EverythingIsCalculated => "EverythingIsCalculated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    fn macro_win_in_one() -> GameState {
        GameState::from_rows(
            [
                "XXX|XXX|XX.",
                "OO.|OO.|...",
                "...|...|...",
                "...|..O|...",
                "...|.O.|...",
                "...|...|...",
                "O..|...|...",
                "...|...|.O.",
                "...|...|...",
            ],
            Some(Move::new(3, 5)),
        )
        .unwrap()
    }

    #[test]
    fn steps_cycle_through_the_four_phases() {
        let mut mcts = MonteCarloTreeSearch::builder(GameState::new()).build();
        let mut names = vec![];
        for _ in 0..5 {
            names.push(mcts.next_action().name());
            mcts.execute_action();
        }
        assert_eq!(
            names,
            [
                "Selection",
                "Expansion",
                "Simulation",
                "Backpropagation",
                "Selection"
            ]
        );
        assert_eq!(mcts.root().children().count(), 81);
        assert_eq!(mcts.root().value().visits, 1);
    }

    #[test]
    fn visits_add_up() {
        let mut mcts = MonteCarloTreeSearch::builder(GameState::new().apply(Move::new(4, 4)))
            .with_random_generator(SeededRandomGenerator::new(5))
            .build();
        assert_eq!(mcts.iterate_n_times(200), 200);

        let root = mcts.root();
        assert_eq!(root.value().visits, 200);
        let child_visits: u32 = root.children().map(|child| child.value().visits).sum();
        // the first iteration simulates from a fresh child, so every visit passes one child
        assert_eq!(child_visits, 200);
        for child in root.children() {
            let node = child.value();
            assert!(node.wins + node.draws <= node.visits);
            assert_eq!(node.mover, Player::O);
        }
    }

    #[test]
    fn proven_win_is_found_and_search_stops() {
        let state = macro_win_in_one();
        let mut mcts = MonteCarloTreeSearch::builder(state).build();
        let performed = mcts.iterate_n_times(10_000);
        assert!(performed < 10_000);
        assert!(mcts.is_fully_calculated());
        assert_eq!(mcts.root().value().bound, Bound::ProvenLoss);
        assert_eq!(mcts.best_move(), Some(Move::new(0, 8)));
    }

    #[test]
    fn without_bounds_terminal_children_are_still_closed() {
        let state = macro_win_in_one();
        let mut mcts = MonteCarloTreeSearch::builder(state)
            .with_proven_bounds(false)
            .build();
        mcts.iterate_n_times(50);
        let winning = mcts
            .root()
            .children()
            .find(|child| child.value().prev_move == Some(Move::new(0, 8)))
            .unwrap();
        assert!(winning.value().is_fully_calculated);
        assert_eq!(winning.value().bound, Bound::None);
        assert_eq!(winning.value().wins, winning.value().visits);
    }

    #[test]
    fn terminal_root_is_fully_calculated_after_one_iteration() {
        let state = macro_win_in_one().apply(Move::new(0, 8));
        let mut mcts = MonteCarloTreeSearch::builder(state).build();
        assert_eq!(mcts.iterate_n_times(10), 1);
        assert!(mcts.is_fully_calculated());
        assert_eq!(mcts.best_move(), None);
    }

    #[test]
    fn ucb_prefers_unvisited_children() {
        let mcts = MonteCarloTreeSearch::builder(GameState::new()).build();
        let mut visited = MctsNode::child(&GameState::new(), Move::new(0, 0), 1);
        visited.record(GameOutcome::Won(Player::X));
        let fresh = MctsNode::child(&GameState::new(), Move::new(0, 1), 1);
        assert!(mcts.ucb_value(1, &fresh) > mcts.ucb_value(1, &visited));
        assert_eq!(mcts.ucb_value(1, &visited), 1.0);
    }
}
