mod axis_scenarios;
mod planner_scenarios;
mod servo_cycle;
