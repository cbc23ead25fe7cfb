mod test_join_roster;
